//! Structured content tree handed over by the host editor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DOC: &str = "doc";
pub const TEXT: &str = "text";
pub const PARAGRAPH: &str = "paragraph";
pub const HEADING: &str = "heading";
pub const BLOCKQUOTE: &str = "blockquote";
pub const LIST_ITEM: &str = "listItem";
pub const BULLET_LIST: &str = "bulletList";
pub const HARD_BREAK: &str = "hardBreak";

/// One node of the editor's JSON content tree.
///
/// `content: None` and `content: Some(vec![])` are different trees: an empty
/// paragraph saved by the editor has no `content` key at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Value>>,
}

impl ContentNode {
    /// A container node of the given type.
    pub fn node(node_type: impl Into<String>, children: Vec<ContentNode>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            content: Some(children),
            ..Default::default()
        }
    }

    /// A node of the given type with no `content` key.
    pub fn leaf(node_type: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            ..Default::default()
        }
    }

    pub fn doc(children: Vec<ContentNode>) -> Self {
        Self::node(DOC, children)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            node_type: Some(TEXT.to_string()),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A paragraph holding a single text run; empty text gives an empty paragraph.
    pub fn paragraph(text: &str) -> Self {
        if text.is_empty() {
            Self::leaf(PARAGRAPH)
        } else {
            Self::node(PARAGRAPH, vec![Self::text(text)])
        }
    }

    pub fn heading(level: u8, text: &str) -> Self {
        let mut attrs = Map::new();
        attrs.insert("level".to_string(), Value::from(level));
        Self {
            attrs: Some(attrs),
            ..Self::node(HEADING, vec![Self::text(text)])
        }
    }

    pub fn hard_break() -> Self {
        Self::leaf(HARD_BREAK)
    }

    /// A document made of one paragraph per line.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self::doc(lines.into_iter().map(Self::paragraph).collect())
    }

    pub fn kind(&self) -> Option<&str> {
        self.node_type.as_deref()
    }

    pub fn children(&self) -> &[ContentNode] {
        self.content.as_deref().unwrap_or_default()
    }
}
