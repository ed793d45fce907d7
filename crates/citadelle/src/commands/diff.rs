//! Diff command handler.

use super::Context;
use crate::document;
use citadelle_history::ContentDiff;
use std::path::PathBuf;

fn print_diff(ctx: &Context, diff: &ContentDiff) -> anyhow::Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(diff)?);
        return Ok(());
    }
    if let Some(warning) = &diff.scale_warning {
        eprintln!(
            "Warning: large comparison ({} x {} lines)",
            warning.old_lines, warning.new_lines
        );
    }
    print!("{}", diff.render());
    Ok(())
}

/// Diff two versions, or a version against a document file's current content.
pub async fn handle_diff(
    ctx: &Context,
    old: &str,
    new: Option<String>,
    live: Option<PathBuf>,
) -> anyhow::Result<()> {
    let old_version = ctx.version(old)?;

    let diff = match (new, live) {
        (_, Some(path)) => {
            let doc = document::load(&path).await?;
            ctx.history
                .diff_against(&old_version.id, &doc.content)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Version not found: {old}"))?
        }
        (Some(new), None) => {
            let new_version = ctx.version(&new)?;
            ctx.history
                .diff_versions(&old_version.id, &new_version.id)
                .ok_or_else(|| anyhow::anyhow!("Version not found: {new}"))?
        }
        (None, None) => anyhow::bail!("Pass a second version id or --live <FILE>"),
    };

    print_diff(ctx, &diff)
}
