//! Version management command handlers.
//!
//! Handles taking, listing, deleting and pruning versions.

use super::Context;
use crate::document;
use chrono::{Local, Utc};
use citadelle_history::version::default_snapshot_label_now;
use citadelle_history::{CreateOutcome, Version, VersionId, VersionKind};
use std::path::Path;

fn kind_label(version: &Version) -> &'static str {
    match version.kind {
        VersionKind::Manual => "manual",
        VersionKind::Auto(_) => "auto",
    }
}

fn print_created(ctx: &Context, outcome: &CreateOutcome) -> anyhow::Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&outcome.version)?);
    } else {
        println!(
            "Created version {} ({})",
            outcome.version.id, outcome.version.label
        );
    }
    if let Some(evicted) = &outcome.evicted {
        eprintln!("Evicted automatic version {} ({})", evicted.id, evicted.label);
    }
    if outcome.over_capacity {
        eprintln!(
            "Warning: document {} holds more than {} versions",
            outcome.version.document_id, ctx.config.capacity
        );
    }
    Ok(())
}

/// Save a manual version of a document file.
pub async fn handle_snapshot(
    ctx: &mut Context,
    file: &Path,
    label: Option<String>,
) -> anyhow::Result<()> {
    let doc = document::load(file).await?;
    let label = label
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(default_snapshot_label_now);

    let outcome = ctx
        .history
        .create_version(&doc.id, label, doc.content, VersionKind::Manual)
        .await?;
    print_created(ctx, &outcome)
}

/// Take a periodic backup of a document file.
pub async fn handle_checkpoint(ctx: &mut Context, file: &Path) -> anyhow::Result<()> {
    let doc = document::load(file).await?;
    match ctx.history.checkpoint(&doc.id, doc.content).await? {
        Some(outcome) => print_created(ctx, &outcome)?,
        None => println!("No changes since the last version of {}", doc.id),
    }
    Ok(())
}

/// List a document's versions, newest first.
pub async fn handle_list(ctx: &Context, document: &str) -> anyhow::Result<()> {
    let document_id = document::resolve_id(document).await?;
    let versions = ctx.history.versions_for_document(&document_id);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    if versions.is_empty() {
        println!("No versions found.");
        return Ok(());
    }

    println!("Versions of {document_id}:");
    println!();
    println!("{:<32} {:<36} {:<7} {:<20}", "ID", "LABEL", "KIND", "CREATED");
    println!("{}", "-".repeat(98));

    for version in versions {
        let created = version
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        let label = if version.label.chars().count() > 36 {
            let head: String = version.label.chars().take(33).collect();
            format!("{head}...")
        } else {
            version.label.clone()
        };
        println!(
            "{:<32} {:<36} {:<7} {:<20}",
            version.id,
            label,
            kind_label(version),
            created
        );
    }
    Ok(())
}

pub async fn handle_delete(ctx: &mut Context, version: &str) -> anyhow::Result<()> {
    match ctx
        .history
        .delete_version(&VersionId::from_string(version))
        .await?
    {
        Some(removed) => println!("Version deleted: {} ({})", removed.id, removed.label),
        None => println!("Version not found: {version}"),
    }
    Ok(())
}

/// Drop automatic versions past the retention window.
pub async fn handle_prune(ctx: &mut Context) -> anyhow::Result<()> {
    let pruned = ctx.history.prune_expired(Utc::now()).await?;
    println!(
        "Pruned {} automatic version(s) older than {} day(s)",
        pruned.len(),
        ctx.config.auto_retention_days
    );
    Ok(())
}
