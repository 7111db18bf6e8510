//! Ordered collection of mirrors.
//!
//! The [`MirrorRegistry`] keeps mirrors in registration order and derives
//! every priority ordering on demand, so the registration order is the
//! tie-breaker between equal priorities. Names are unique, compared
//! ignoring ASCII case.

use tracing::{debug, warn};

use crate::mirror::{Mirror, MirrorListing};

/// Registration-ordered list of mirrors.
pub struct MirrorRegistry {
    mirrors: Vec<Box<dyn Mirror>>,
}

impl MirrorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mirrors: Vec::new(),
        }
    }

    /// Appends a mirror.
    ///
    /// A mirror whose name is already registered is skipped and `false` is
    /// returned.
    #[tracing::instrument(skip(self, mirror), fields(mirror_name))]
    pub fn register(&mut self, mirror: Box<dyn Mirror>) -> bool {
        tracing::Span::current().record("mirror_name", mirror.name());
        if self.position_of(mirror.name()).is_some() {
            warn!(name = mirror.name(), "Mirror name already registered, skipping");
            return false;
        }
        debug!(
            name = mirror.name(),
            priority = mirror.priority(),
            enabled = mirror.is_enabled(),
            "Registering mirror"
        );
        self.mirrors.push(mirror);
        true
    }

    /// Inserts a mirror ahead of every registered mirror.
    ///
    /// Used for the override mirror. A registered mirror with the same name
    /// is replaced.
    #[tracing::instrument(skip(self, mirror), fields(mirror_name))]
    pub fn register_first(&mut self, mirror: Box<dyn Mirror>) {
        tracing::Span::current().record("mirror_name", mirror.name());
        if let Some(index) = self.position_of(mirror.name()) {
            warn!(name = mirror.name(), "Replacing mirror registered under the same name");
            self.mirrors.remove(index);
        }
        debug!(
            name = mirror.name(),
            priority = mirror.priority(),
            "Registering mirror at front"
        );
        self.mirrors.insert(0, mirror);
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.mirrors
            .iter()
            .position(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// Returns the number of registered mirrors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    /// Returns true if no mirrors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    /// Finds a mirror by name, ignoring ASCII case.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&dyn Mirror> {
        self.mirrors
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
            .map(AsRef::as_ref)
    }

    /// Returns every mirror name in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.mirrors.iter().map(|m| m.name()).collect()
    }

    /// Returns enabled mirrors, ascending by priority.
    ///
    /// The sort is stable: equal priorities keep registration order.
    #[must_use]
    pub fn enabled_by_priority(&self) -> Vec<&dyn Mirror> {
        let mut enabled: Vec<&dyn Mirror> = self
            .mirrors
            .iter()
            .filter(|m| m.is_enabled())
            .map(AsRef::as_ref)
            .collect();
        enabled.sort_by_key(|m| m.priority());
        enabled
    }

    /// Returns every mirror (enabled or not), ascending by priority.
    #[must_use]
    pub fn listing(&self) -> Vec<MirrorListing> {
        let mut listing: Vec<MirrorListing> = self
            .mirrors
            .iter()
            .map(|m| MirrorListing::of(m.as_ref()))
            .collect();
        listing.sort_by_key(|entry| entry.priority);
        listing
    }
}

impl std::fmt::Debug for MirrorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorRegistry")
            .field("mirror_count", &self.mirrors.len())
            .field("mirrors", &self.names())
            .finish()
    }
}

impl Default for MirrorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
