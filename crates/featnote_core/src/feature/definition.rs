//! Feature definition data shapes.

use crate::feature::context::ComputeContext;
use crate::model::note::Note;
use crate::model::value::AttributeValue;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("valid date regex")
});

/// Result of one feature computation for one note.
///
/// `Err` carries a human-readable failure message; the engine isolates it.
pub type ComputeResult = Result<AttributeValue, String>;

/// Pure computation over one note and the shared pass context.
pub type ComputeFn = fn(&Note, &ComputeContext) -> ComputeResult;

/// Computation kind of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Pure per-note function.
    Computed,
    /// User-editable stored value.
    Property,
    /// Function of the whole note collection.
    Rollup,
    /// Display-only or side-effecting; contributes no attribute.
    Behavior,
}

impl FeatureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Computed => "computed",
            Self::Property => "property",
            Self::Rollup => "rollup",
            Self::Behavior => "behavior",
        }
    }
}

/// Catalog grouping used by feature browsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureCategory {
    Productivity,
    Organization,
    Analytics,
    Automation,
}

impl FeatureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Productivity => "productivity",
            Self::Organization => "organization",
            Self::Analytics => "analytics",
            Self::Automation => "automation",
        }
    }

    /// Parses the stable lowercase category name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "productivity" => Some(Self::Productivity),
            "organization" => Some(Self::Organization),
            "analytics" => Some(Self::Analytics),
            "automation" => Some(Self::Automation),
            _ => None,
        }
    }
}

/// Rendering hint for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderHint {
    Text,
    Number,
    Badge,
    Progress,
    Date,
}

/// Default configuration shipped with a feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefaultConfig {
    /// Allowed values for enumerated property features. Empty means free form.
    pub options: Vec<String>,
    /// Option -> display color.
    pub colors: BTreeMap<String, String>,
}

impl DefaultConfig {
    pub fn with_options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            colors: BTreeMap::new(),
        }
    }

    pub fn with_color(mut self, option: impl Into<String>, color: impl Into<String>) -> Self {
        self.colors.insert(option.into(), color.into());
        self
    }
}

/// Immutable feature definition registered once per process.
#[derive(Clone)]
pub struct FeatureDefinition {
    /// Stable unique identifier, e.g. `word-count`.
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: FeatureKind,
    pub category: FeatureCategory,
    pub icon: Option<String>,
    /// Key under which the value is attached to enriched notes.
    pub attribute_role: Option<String>,
    pub render_as: Option<RenderHint>,
    /// Present for computed and rollup kinds.
    pub compute: Option<ComputeFn>,
    pub default_config: Option<DefaultConfig>,
}

impl FeatureDefinition {
    /// Creates a bare definition; optional parts are added with the `with_*`
    /// builders.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: FeatureKind,
        category: FeatureCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
            category,
            icon: None,
            attribute_role: None,
            render_as: None,
            compute: None,
            default_config: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_attribute_role(mut self, role: impl Into<String>) -> Self {
        self.attribute_role = Some(role.into());
        self
    }

    pub fn with_render_as(mut self, hint: RenderHint) -> Self {
        self.render_as = Some(hint);
        self
    }

    pub fn with_compute(mut self, compute: ComputeFn) -> Self {
        self.compute = Some(compute);
        self
    }

    pub fn with_default_config(mut self, config: DefaultConfig) -> Self {
        self.default_config = Some(config);
        self
    }

    /// Declared option list, empty when the feature is free form.
    pub fn options(&self) -> &[String] {
        self.default_config
            .as_ref()
            .map_or(&[], |config| config.options.as_slice())
    }

    /// Converts user input into the typed value stored for this feature.
    ///
    /// # Errors
    /// - `NotAProperty` when the feature kind is not `Property`.
    /// - `NotAnOption` when `raw` is outside a non-empty option list.
    /// - `Malformed` when `raw` does not parse for the render hint.
    pub fn property_value(&self, raw: &str) -> Result<AttributeValue, PropertyValueError> {
        if self.kind != FeatureKind::Property {
            return Err(PropertyValueError::NotAProperty(self.id.clone()));
        }

        let trimmed = raw.trim();
        let options = self.options();
        if !options.is_empty() && !options.iter().any(|option| option == trimmed) {
            return Err(PropertyValueError::NotAnOption {
                feature_id: self.id.clone(),
                value: trimmed.to_string(),
            });
        }

        self.coerce(trimmed)
    }

    /// Converts query input into the value a filter on this feature compares
    /// against.
    ///
    /// Property features go through [`Self::property_value`]; other kinds are
    /// parsed by render hint only.
    pub fn filter_value(&self, raw: &str) -> Result<AttributeValue, PropertyValueError> {
        if self.kind == FeatureKind::Property {
            return self.property_value(raw);
        }
        self.coerce(raw.trim())
    }

    fn coerce(&self, trimmed: &str) -> Result<AttributeValue, PropertyValueError> {
        let malformed = |expected: &'static str| PropertyValueError::Malformed {
            feature_id: self.id.clone(),
            value: trimmed.to_string(),
            expected,
        };

        match self.render_as {
            Some(RenderHint::Badge) => Ok(AttributeValue::Badge(trimmed.to_string())),
            Some(RenderHint::Date) => {
                if DATE_RE.is_match(trimmed) {
                    Ok(AttributeValue::Date(trimmed.to_string()))
                } else {
                    Err(malformed("YYYY-MM-DD"))
                }
            }
            Some(RenderHint::Number) => trimmed
                .parse::<i64>()
                .map(AttributeValue::Number)
                .map_err(|_| malformed("integer")),
            Some(RenderHint::Progress) => match trimmed.parse::<f64>() {
                Ok(ratio) if (0.0..=1.0).contains(&ratio) => Ok(AttributeValue::Progress(ratio)),
                _ => Err(malformed("ratio between 0 and 1")),
            },
            Some(RenderHint::Text) | None => Ok(AttributeValue::Text(trimmed.to_string())),
        }
    }
}

impl Debug for FeatureDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureDefinition")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("category", &self.category)
            .field("attribute_role", &self.attribute_role)
            .field("render_as", &self.render_as)
            .field("has_compute", &self.compute.is_some())
            .finish_non_exhaustive()
    }
}

/// Rejections for user-entered property values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValueError {
    NotAProperty(String),
    NotAnOption {
        feature_id: String,
        value: String,
    },
    Malformed {
        feature_id: String,
        value: String,
        expected: &'static str,
    },
}

impl Display for PropertyValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAProperty(feature_id) => {
                write!(f, "feature `{feature_id}` does not store property values")
            }
            Self::NotAnOption { feature_id, value } => {
                write!(f, "`{value}` is not an option of feature `{feature_id}`")
            }
            Self::Malformed {
                feature_id,
                value,
                expected,
            } => write!(
                f,
                "`{value}` is not a valid value for feature `{feature_id}` (expected {expected})"
            ),
        }
    }
}

impl Error for PropertyValueError {}
