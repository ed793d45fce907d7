//! Restore command handler.

use super::Context;
use crate::document;
use citadelle_history::{OpenDocuments, VersionId};
use std::path::Path;

/// Restore a document file to a version.
///
/// The file's current content is saved as an automatic version first, then
/// the restored content is written back to the file.
pub async fn handle_restore(ctx: &mut Context, version: &str, file: &Path) -> anyhow::Result<()> {
    let doc = document::load(file).await?;
    let target = ctx.version(version)?;
    if target.document_id != doc.id {
        anyhow::bail!(
            "Version {version} belongs to document {}, not {}",
            target.document_id,
            doc.id
        );
    }

    let document_id = doc.id.clone();
    let mut docs = OpenDocuments::new();
    docs.open(doc);

    let Some(outcome) = ctx
        .history
        .restore(&mut docs, &VersionId::from_string(version))
        .await?
    else {
        anyhow::bail!("Version not found: {version}");
    };

    let Some(restored) = docs.get_mut(&document_id) else {
        anyhow::bail!("Document {document_id} closed during restore");
    };
    restored.mark_saved();
    document::save(file, restored).await?;

    println!("Restored {} to version {}", file.display(), outcome.restored);
    println!(
        "Previous content saved as {} ({})",
        outcome.safety.id, outcome.safety.label
    );
    Ok(())
}
