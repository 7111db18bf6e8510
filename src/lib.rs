//! Modelfetch Core Library
//!
//! Locates and downloads speech-model artifacts from an ordered set of
//! hosting mirrors, falling back to the next mirror whenever one is
//! unreachable or fails mid-transfer.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`mirror`] - The [`Mirror`] trait and the built-in hosting sources
//! - [`resolver`] - Mirror registry, probing and download-with-fallback
//! - [`download`] - Streaming HTTP transport behind the [`Downloader`] trait
//! - [`http`] - Shared `reqwest` client policy (timeouts, user agent, proxies)

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod http;
pub mod mirror;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use download::{DownloadError, Downloader, HttpDownloader, ProgressCallback};
pub use http::HttpTimeouts;
pub use mirror::{ExecutionContext, Mirror, MirrorListing, ProbeFailure, ProbeOutcome};
pub use resolver::{
    DownloadAttempt, FetchError, FetchedArtifact, MirrorEnvironment, MirrorRegistry,
    MirrorResolver, ResolverOptions, build_default_mirror_resolver,
};
