//! Line diff between two content snapshots.
//!
//! The diff is a longest-common-subsequence over extracted text lines. When
//! backtracking meets two equally long paths, the insertion is emitted first
//! (walking backwards), so in forward order a changed line reads as
//! `removed` followed by `added`.

use crate::config::DEFAULT_DIFF_WARN_CELLS;
use crate::content::ContentNode;
use crate::error::HistoryResult;
use crate::extract::extract_plain_text;
use citadelle_util::TimingGuard;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::warn;

/// How a line relates the old text to the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffTag {
    Same,
    Added,
    Removed,
}

/// One line of diff output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub tag: DiffTag,
    pub text: String,
}

impl DiffLine {
    fn new(tag: DiffTag, text: &str) -> Self {
        Self {
            tag,
            text: text.to_string(),
        }
    }
}

/// Attached to a diff whose inputs were large enough to make it slow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffScaleWarning {
    pub old_lines: usize,
    pub new_lines: usize,
    /// Size of the comparison table, `old_lines * new_lines`.
    pub cells: u64,
}

/// Tunables for the diff engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Table size above which a [`DiffScaleWarning`] is attached.
    pub warn_cells: u64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            warn_cells: DEFAULT_DIFF_WARN_CELLS,
        }
    }
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDiff {
    pub lines: Vec<DiffLine>,
    pub added: usize,
    pub removed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_warning: Option<DiffScaleWarning>,
}

impl ContentDiff {
    fn from_lines(lines: Vec<DiffLine>, scale_warning: Option<DiffScaleWarning>) -> Self {
        let added = lines.iter().filter(|l| l.tag == DiffTag::Added).count();
        let removed = lines.iter().filter(|l| l.tag == DiffTag::Removed).count();
        Self {
            lines,
            added,
            removed,
            scale_warning,
        }
    }

    /// True when no line was added or removed.
    pub fn is_identical(&self) -> bool {
        self.added == 0 && self.removed == 0
    }

    /// Lines common to both sides, in order.
    pub fn same_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.tag == DiffTag::Same)
            .map(|l| l.text.as_str())
    }

    /// Summary such as `-2 +3 lines`.
    pub fn summary(&self) -> String {
        format!("-{} +{} lines", self.removed, self.added)
    }

    /// Human-readable rendering: the summary, then one prefixed line per entry.
    pub fn render(&self) -> String {
        let mut out = self.summary();
        out.push('\n');
        for line in &self.lines {
            let prefix = match line.tag {
                DiffTag::Same => ' ',
                DiffTag::Added => '+',
                DiffTag::Removed => '-',
            };
            let _ = writeln!(out, "{prefix} {}", line.text);
        }
        out
    }
}

/// LCS line diff of two already split sequences.
pub fn diff_lines(old: &[&str], new: &[&str]) -> Vec<DiffLine> {
    let (m, n) = (old.len(), new.len());
    let width = n + 1;

    // table[i * width + j] = LCS length of old[..i] and new[..j]
    let mut table = vec![0u32; (m + 1) * width];
    for i in 1..=m {
        for j in 1..=n {
            table[i * width + j] = if old[i - 1] == new[j - 1] {
                table[(i - 1) * width + (j - 1)] + 1
            } else {
                table[(i - 1) * width + j].max(table[i * width + (j - 1)])
            };
        }
    }

    let mut lines = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old[i - 1] == new[j - 1] {
            lines.push(DiffLine::new(DiffTag::Same, old[i - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i * width + (j - 1)] >= table[(i - 1) * width + j]) {
            lines.push(DiffLine::new(DiffTag::Added, new[j - 1]));
            j -= 1;
        } else {
            lines.push(DiffLine::new(DiffTag::Removed, old[i - 1]));
            i -= 1;
        }
    }

    lines.reverse();
    lines
}

/// Diff two plain texts with default options.
pub fn diff_texts(old: &str, new: &str) -> ContentDiff {
    diff_texts_with(old, new, &DiffOptions::default())
}

/// Diff two plain texts. Trailing whitespace is ignored on both sides.
pub fn diff_texts_with(old: &str, new: &str, options: &DiffOptions) -> ContentDiff {
    let old: Vec<&str> = old.trim_end().split('\n').collect();
    let new: Vec<&str> = new.trim_end().split('\n').collect();

    let cells = old.len() as u64 * new.len() as u64;
    let scale_warning = (cells > options.warn_cells).then(|| {
        warn!(
            old_lines = old.len(),
            new_lines = new.len(),
            cells,
            "Large diff, comparison may be slow"
        );
        DiffScaleWarning {
            old_lines: old.len(),
            new_lines: new.len(),
            cells,
        }
    });

    let _timing = TimingGuard::diff(old.len(), new.len());
    ContentDiff::from_lines(diff_lines(&old, &new), scale_warning)
}

/// Diff two content snapshots with default options.
pub fn diff_contents(old: &ContentNode, new: &ContentNode) -> ContentDiff {
    diff_contents_with(old, new, &DiffOptions::default())
}

/// Diff two content snapshots.
pub fn diff_contents_with(
    old: &ContentNode,
    new: &ContentNode,
    options: &DiffOptions,
) -> ContentDiff {
    diff_texts_with(&extract_plain_text(old), &extract_plain_text(new), options)
}

/// Diff two snapshots on the blocking thread pool, keeping the caller responsive.
pub async fn diff_contents_in_background(
    old: ContentNode,
    new: ContentNode,
    options: DiffOptions,
) -> HistoryResult<ContentDiff> {
    let diff =
        tokio::task::spawn_blocking(move || diff_contents_with(&old, &new, &options)).await?;
    Ok(diff)
}
