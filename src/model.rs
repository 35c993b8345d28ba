//! Content items produced by the generation pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DiplomError;

/// Whether an outline item is a research goal or a research task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Goal,
    Task,
}

impl ItemKind {
    /// Identifier prefix for items of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            ItemKind::Goal => "g",
            ItemKind::Task => "t",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Goal => "goal",
            ItemKind::Task => "task",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = DiplomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "goal" => Ok(ItemKind::Goal),
            "task" => Ok(ItemKind::Task),
            other => Err(DiplomError::invalid(
                "type",
                format!("must be 'goal' or 'task', got '{}'", other),
            )),
        }
    }
}

/// Build a fresh identifier: `<prefix>_<8 hex chars>`.
///
/// The suffix comes from a random v4 UUID. Collisions are not checked, so ids
/// are only practically unique within a run.
pub fn make_id(kind: ItemKind) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", kind.prefix(), &hex[..8])
}

/// One generated outline item. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub id: String,
    pub text: String,
}

impl ContentItem {
    pub fn new(kind: ItemKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            id: make_id(kind),
            text: text.into(),
        }
    }
}

/// Item text before it has been assigned an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub kind: ItemKind,
    pub text: String,
}

impl Draft {
    pub fn goal(text: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Goal,
            text: text.into(),
        }
    }

    pub fn task(text: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Task,
            text: text.into(),
        }
    }

    pub fn into_item(self) -> ContentItem {
        ContentItem::new(self.kind, self.text)
    }
}

/// Response body for rephrase/replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemText {
    pub id: String,
    pub text: String,
}
