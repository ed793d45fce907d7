//! Plain-text extraction from content trees.

use crate::content::{ContentNode, BLOCKQUOTE, HARD_BREAK, HEADING, LIST_ITEM, PARAGRAPH, TEXT};

/// Node types that end with a newline after their children.
pub const BLOCK_TYPES: [&str; 4] = [PARAGRAPH, HEADING, BLOCKQUOTE, LIST_ITEM];

fn is_block(node_type: &str) -> bool {
    BLOCK_TYPES.contains(&node_type)
}

enum Step<'a> {
    Visit(&'a ContentNode),
    EndBlock,
}

/// Flatten a content tree into plain text.
///
/// Text nodes contribute their text, block nodes append a newline after their
/// children, hard breaks contribute a newline, other containers concatenate
/// their children. Anything else contributes nothing. Uses an explicit stack,
/// so nesting depth is bounded only by memory.
pub fn extract_plain_text(root: &ContentNode) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Visit(root)];

    while let Some(step) = stack.pop() {
        let node = match step {
            Step::EndBlock => {
                out.push('\n');
                continue;
            }
            Step::Visit(node) => node,
        };

        if node.kind() == Some(TEXT) {
            out.push_str(node.text.as_deref().unwrap_or_default());
        } else if let Some(children) = &node.content {
            if node.kind().is_some_and(is_block) {
                stack.push(Step::EndBlock);
            }
            stack.extend(children.iter().rev().map(Step::Visit));
        } else if node.kind() == Some(HARD_BREAK) {
            out.push('\n');
        }
    }

    out
}
