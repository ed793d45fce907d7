//! End-to-end tests of the version history through the public API.

use citadelle_history::{
    diff_contents, extract_plain_text, AutoReason, ContentNode, DiffTag, Document,
    HistoryConfig, LiveDocuments, OpenDocuments, Version, VersionHistory, VersionKind,
    VersionStore,
};
use chrono::{Duration, TimeZone, Utc};
use citadelle_storage::{JsonStorage, MemoryStorage};
use std::collections::HashMap;
use tempfile::TempDir;

const AUTO: VersionKind = VersionKind::Auto(AutoReason::Periodic);

async fn history() -> VersionHistory<MemoryStorage> {
    VersionHistory::open(MemoryStorage::new(), &HistoryConfig::default())
        .await
        .unwrap()
}

fn lines(lines: &[&str]) -> ContentNode {
    ContentNode::from_lines(lines.iter().copied())
}

#[tokio::test]
async fn scenario_first_manual_version() {
    let mut history = history().await;
    history
        .create_version("D", "v1", lines(&["contenu A"]), VersionKind::Manual)
        .await
        .unwrap();

    let versions = history.versions_for_document("D");
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].label, "v1");
    assert!(!versions[0].is_auto());
}

#[test]
fn scenario_changed_line_diff() {
    let diff = diff_contents(&lines(&["Bonjour", "Monde"]), &lines(&["Bonjour", "Monde juridique"]));
    let tags: Vec<_> = diff.lines.iter().map(|l| (l.tag, l.text.as_str())).collect();
    assert_eq!(
        tags,
        [
            (DiffTag::Same, "Bonjour"),
            (DiffTag::Removed, "Monde"),
            (DiffTag::Added, "Monde juridique"),
        ]
    );
}

#[tokio::test]
async fn scenario_full_of_auto_evicts_oldest() {
    let mut history = history().await;
    let mut ids = Vec::new();
    for i in 0..50 {
        let outcome = history
            .create_version("D", format!("auto {i}"), lines(&[&i.to_string()]), AUTO)
            .await
            .unwrap();
        ids.push(outcome.version.id);
    }

    let outcome = history
        .create_version("D", "auto 50", lines(&["50"]), AUTO)
        .await
        .unwrap();

    assert_eq!(history.versions_for_document("D").len(), 50);
    assert_eq!(outcome.evicted.map(|v| v.id), Some(ids[0].clone()));
    assert!(history.get(&ids[0]).is_none());
}

#[tokio::test]
async fn scenario_full_of_manual_grows() {
    let mut history = history().await;
    for i in 0..50 {
        history
            .create_version("D", format!("manual {i}"), lines(&["x"]), VersionKind::Manual)
            .await
            .unwrap();
    }

    let outcome = history
        .create_version("D", "auto", lines(&["y"]), AUTO)
        .await
        .unwrap();

    assert_eq!(history.versions_for_document("D").len(), 51);
    assert!(outcome.over_capacity);
    assert!(outcome.evicted.is_none());
}

#[tokio::test]
async fn capacity_holds_while_auto_versions_remain() {
    let mut history = history().await;
    for i in 0..200 {
        let kind = if i % 5 == 0 { VersionKind::Manual } else { AUTO };
        history
            .create_version("D", format!("v{i}"), lines(&["x"]), kind)
            .await
            .unwrap();
        assert!(history.versions_for_document("D").len() <= 50);
    }
}

#[test]
fn ordering_is_newest_first() {
    let base = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    let mut store = VersionStore::default();
    for (label, minutes) in [("v0", 0), ("v3", 30), ("v1", 10), ("v2a", 20), ("v2b", 20)] {
        store
            .insert(
                Version::new("D", label, lines(&["x"]), VersionKind::Manual)
                    .with_timestamp(base + Duration::minutes(minutes)),
            )
            .unwrap();
    }

    let labels: Vec<_> = store
        .versions_for_document("D")
        .iter()
        .map(|v| v.label.as_str())
        .collect();
    assert_eq!(labels, ["v3", "v2a", "v2b", "v1", "v0"]);
    assert_eq!(store.latest_for_document("D").unwrap().label, "v3");
}

#[tokio::test]
async fn versions_created_together_list_in_creation_order() {
    let mut history = history().await;
    for i in 0..20 {
        history
            .create_version("D", format!("v{i}"), lines(&["x"]), VersionKind::Manual)
            .await
            .unwrap();
    }

    let versions = history.versions_for_document("D");
    assert!(versions
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    for pair in versions.windows(2) {
        if pair[0].timestamp == pair[1].timestamp {
            let first: usize = pair[0].label[1..].parse().unwrap();
            let second: usize = pair[1].label[1..].parse().unwrap();
            assert!(first < second);
        }
    }
    let newest_tie = versions
        .iter()
        .rev()
        .find(|v| v.timestamp == versions[0].timestamp)
        .unwrap();
    assert_eq!(
        history.store().latest_for_document("D").unwrap().id,
        newest_tie.id
    );
}

#[test]
fn diff_identity_reproduces_text() {
    let content = ContentNode::doc(vec![
        ContentNode::heading(1, "Conclusions"),
        ContentNode::paragraph("Plaise au tribunal"),
        ContentNode::paragraph(""),
        ContentNode::paragraph("de débouter le demandeur."),
    ]);
    let diff = diff_contents(&content, &content);

    assert_eq!(diff.added, 0);
    assert_eq!(diff.removed, 0);
    let same: Vec<&str> = diff.same_lines().collect();
    assert_eq!(same.join("\n"), extract_plain_text(&content).trim_end());
}

#[test]
fn diff_same_lines_are_symmetric() {
    let a = lines(&["Article 1", "Article 2", "Article 3", "Signature"]);
    let b = lines(&["Article 1", "Article 3", "Annexe", "Signature"]);

    let count = |diff: &citadelle_history::ContentDiff| {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for line in diff.same_lines() {
            *counts.entry(line.to_string()).or_default() += 1;
        }
        counts
    };

    assert_eq!(count(&diff_contents(&a, &b)), count(&diff_contents(&b, &a)));
}

#[tokio::test]
async fn restore_keeps_pre_restore_content() {
    let mut history = history().await;
    let document = Document::new("Assignation", lines(&["rédaction initiale"]));
    let id = document.id.clone();
    let mut docs = OpenDocuments::new();
    docs.open(document);

    let v1 = history
        .create_version(&id, "v1", docs.live_content(&id).unwrap(), VersionKind::Manual)
        .await
        .unwrap()
        .version;
    docs.replace_content(&id, lines(&["rédaction modifiée"]));
    let before = docs.live_content(&id).unwrap();

    history.restore(&mut docs, &v1.id).await.unwrap().unwrap();

    assert_eq!(docs.live_content(&id).unwrap(), v1.content);
    assert!(history
        .versions_for_document(&id)
        .iter()
        .any(|v| v.is_auto() && v.content == before));
}

#[tokio::test]
async fn deletion_is_isolated_across_documents() {
    let mut history = history().await;
    let a1 = history
        .create_version("A", "a1", lines(&["a"]), VersionKind::Manual)
        .await
        .unwrap()
        .version;
    history
        .create_version("A", "a2", lines(&["a"]), VersionKind::Manual)
        .await
        .unwrap();
    let b1 = history
        .create_version("B", "b1", lines(&["b"]), VersionKind::Manual)
        .await
        .unwrap()
        .version;

    history.delete_version(&a1.id).await.unwrap();

    let a: Vec<_> = history
        .versions_for_document("A")
        .iter()
        .map(|v| v.label.clone())
        .collect();
    assert_eq!(a, ["a2"]);
    assert_eq!(history.versions_for_document("B")[0].id, b1.id);
}

#[tokio::test]
async fn history_survives_reopen_from_disk() {
    let dir = TempDir::new().unwrap();
    let config = HistoryConfig::default();

    let mut history = VersionHistory::open(JsonStorage::new(dir.path()), &config)
        .await
        .unwrap();
    let v1 = history
        .create_version("D", "v1", lines(&["un"]), VersionKind::Manual)
        .await
        .unwrap()
        .version;
    history
        .create_version("D", "auto", lines(&["deux"]), AUTO)
        .await
        .unwrap();
    drop(history);

    assert!(dir.path().join("citadelle-versions.json").exists());

    let reopened = VersionHistory::open(JsonStorage::new(dir.path()), &config)
        .await
        .unwrap();
    assert_eq!(reopened.get(&v1.id), Some(&v1));
    assert_eq!(reopened.versions_for_document("D").len(), 2);
    assert_eq!(
        reopened.store().latest_for_document("D").map(|v| v.kind),
        Some(VersionKind::Auto(AutoReason::Periodic))
    );
}
