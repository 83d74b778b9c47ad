//! Typed attribute values attached to enriched notes.
//!
//! Every feature output and every stored property is one of these variants,
//! so filters compare values structurally and renderers match exhaustively.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Attribute role -> value mapping for one note.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// One `(tag, count)` entry of a ranking rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

impl TagCount {
    pub fn new(tag: impl Into<String>, count: u64) -> Self {
        Self {
            tag: tag.into(),
            count,
        }
    }
}

/// Tagged value union for feature outputs and stored properties.
///
/// Equality is exact: two values are equal only when both the variant and
/// the payload match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Text(String),
    Number(i64),
    /// Short enumerated label, e.g. a priority.
    Badge(String),
    /// Calendar date as `YYYY-MM-DD`.
    Date(String),
    /// Completion ratio in `0.0..=1.0`.
    Progress(f64),
    /// Ordered ranking produced by rollups.
    Ranking(Vec<TagCount>),
}

impl AttributeValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn badge(value: impl Into<String>) -> Self {
        Self::Badge(value.into())
    }

    /// Stable variant name, matching the serialized `kind` tag.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Badge(_) => "badge",
            Self::Date(_) => "date",
            Self::Progress(_) => "progress",
            Self::Ranking(_) => "ranking",
        }
    }

    /// Borrowed string payload for the text-like variants.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) | Self::Badge(value) | Self::Date(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) | Self::Badge(value) | Self::Date(value) => f.write_str(value),
            Self::Number(value) => write!(f, "{value}"),
            Self::Progress(value) => write!(f, "{:.0}%", value * 100.0),
            Self::Ranking(entries) => {
                for (idx, entry) in entries.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} ({})", entry.tag, entry.count)?;
                }
                Ok(())
            }
        }
    }
}
