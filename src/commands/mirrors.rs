//! Mirrors command handler: list every configured mirror.

use anyhow::Result;
use modelfetch_core::MirrorListing;

use super::CommandContext;
use crate::cli::MirrorsArgs;

pub fn run_mirrors_command(ctx: &CommandContext, args: &MirrorsArgs) -> Result<()> {
    let resolver = ctx.build_resolver(&args.mirror)?;
    let listing = resolver.mirror_listing();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print!("{}", render_listing(&listing));
    }
    Ok(())
}

fn render_listing(listing: &[MirrorListing]) -> String {
    let mut out = format!("{:>8}  {:<8}  {}\n", "PRIORITY", "STATUS", "NAME");
    for entry in listing {
        let status = if entry.enabled { "enabled" } else { "disabled" };
        out.push_str(&format!(
            "{:>8}  {:<8}  {}\n",
            entry.priority, status, entry.name
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_listing_rows_in_given_order() {
        let listing = vec![
            MirrorListing {
                name: "Custom".to_string(),
                priority: 1,
                enabled: true,
            },
            MirrorListing {
                name: "ModelScope".to_string(),
                priority: 20,
                enabled: false,
            },
        ];
        let rendered = render_listing(&listing);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("PRIORITY"));
        assert_eq!(lines[1], "       1  enabled   Custom");
        assert_eq!(lines[2], "      20  disabled  ModelScope");
    }
}
