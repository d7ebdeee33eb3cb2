//! Structured data attached to every entity.
//!
//! A `CellData` record carries a name, a type string, a URI and a keyed bag
//! of typed `PropertyDescriptor`s. The property editor edits values in
//! place; the key set of a record is fixed once the entity exists.

use crate::error::{FieldError, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured record attached to an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub props: BTreeMap<String, PropertyDescriptor>,
}

impl CellData {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            uri: uri.into(),
            props: BTreeMap::new(),
        }
    }

    /// Builder-style helper used by the template catalogue.
    pub fn with_prop(mut self, key: &str, prop: PropertyDescriptor) -> Self {
        self.props.insert(key.to_string(), prop);
        self
    }

    /// True when both records have exactly the same property keys.
    pub fn same_keys(&self, other: &CellData) -> bool {
        self.props.len() == other.props.len() && self.props.keys().eq(other.props.keys())
    }

    /// Check every property against its declared constraints.
    ///
    /// # Errors
    /// Returns a `ValidationError` listing every failing field, in key order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields: Vec<FieldError> = self
            .props
            .iter()
            .flat_map(|(key, prop)| prop.validate(key))
            .collect();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }
}

/// A file reference stored by a `file` property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub id: String,
    pub name: String,
    pub mime: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// The kind tag of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Number,
    Boolean,
    Enum,
    File,
}

/// A typed property. The serialized form is tagged by `type`, so a value
/// that does not match its declared kind fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyDescriptor {
    String {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default)]
        required: bool,
    },
    Number {
        value: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default)]
        required: bool,
    },
    Boolean {
        value: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default)]
        required: bool,
    },
    Enum {
        value: String,
        #[serde(default)]
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default)]
        required: bool,
    },
    File {
        value: Option<FileRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default)]
        required: bool,
    },
}

/// A new value for an existing property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(Option<f64>),
    Bool(bool),
    File(Option<FileRef>),
}

impl PropertyDescriptor {
    pub fn text(label: &str, value: &str) -> Self {
        Self::String {
            value: value.to_string(),
            label: Some(label.to_string()),
            description: None,
            required: false,
        }
    }

    pub fn number(label: &str, value: f64) -> Self {
        Self::Number {
            value: Some(value),
            min: None,
            max: None,
            step: None,
            label: Some(label.to_string()),
            required: false,
        }
    }

    pub fn boolean(label: &str, value: bool) -> Self {
        Self::Boolean {
            value,
            label: Some(label.to_string()),
            required: false,
        }
    }

    pub fn choice(label: &str, value: &str, options: &[&str]) -> Self {
        Self::Enum {
            value: value.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            label: Some(label.to_string()),
            required: false,
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::String { .. } => PropertyKind::String,
            Self::Number { .. } => PropertyKind::Number,
            Self::Boolean { .. } => PropertyKind::Boolean,
            Self::Enum { .. } => PropertyKind::Enum,
            Self::File { .. } => PropertyKind::File,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::String { label, .. }
            | Self::Number { label, .. }
            | Self::Boolean { label, .. }
            | Self::Enum { label, .. }
            | Self::File { label, .. } => label.as_deref(),
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            Self::String { required, .. }
            | Self::Number { required, .. }
            | Self::Boolean { required, .. }
            | Self::Enum { required, .. }
            | Self::File { required, .. } => *required,
        }
    }

    /// Replace the current value. The new value must match the declared kind.
    ///
    /// # Errors
    /// Returns the expected kind when `value` is of a different kind.
    pub fn set_value(&mut self, value: PropertyValue) -> Result<(), PropertyKind> {
        match (self, value) {
            (Self::String { value, .. }, PropertyValue::Text(v))
            | (Self::Enum { value, .. }, PropertyValue::Text(v)) => *value = v,
            (Self::Number { value, .. }, PropertyValue::Number(v)) => *value = v,
            (Self::Boolean { value, .. }, PropertyValue::Bool(v)) => *value = v,
            (Self::File { value, .. }, PropertyValue::File(v)) => *value = v,
            (this, _) => return Err(this.kind()),
        }
        Ok(())
    }

    /// Constraint check for one field. Empty when the field is valid.
    pub fn validate(&self, key: &str) -> Vec<FieldError> {
        let label = self.label().unwrap_or(key).to_string();
        let fail = |message: String| FieldError {
            key: key.to_string(),
            label: label.clone(),
            message,
        };

        let mut errors = Vec::new();
        match self {
            Self::String {
                value, required, ..
            } => {
                if *required && value.trim().is_empty() {
                    errors.push(fail("is required".into()));
                }
            }
            Self::Number {
                value,
                min,
                max,
                required,
                ..
            } => match value {
                None if *required => errors.push(fail("is required".into())),
                None => {}
                Some(v) if !v.is_finite() => errors.push(fail("must be a number".into())),
                Some(v) => {
                    if let Some(min) = min
                        && v < min
                    {
                        errors.push(fail(format!("must be at least {min}")));
                    }
                    if let Some(max) = max
                        && v > max
                    {
                        errors.push(fail(format!("must be at most {max}")));
                    }
                }
            },
            Self::Boolean { .. } => {}
            Self::Enum {
                value,
                options,
                required,
                ..
            } => {
                if value.is_empty() {
                    if *required {
                        errors.push(fail("is required".into()));
                    }
                } else if !options.iter().any(|o| o == value) {
                    errors.push(fail(format!("must be one of {}", options.join(", "))));
                }
            }
            Self::File {
                value, required, ..
            } => {
                if *required && value.is_none() {
                    errors.push(fail("is required".into()));
                }
            }
        }
        errors
    }

    /// Structural soundness of a descriptor loaded from outside (import).
    /// Unlike `validate`, this rejects declarations that no edit could fix.
    pub fn check_structure(&self) -> Result<(), String> {
        match self {
            Self::Enum { options, value, .. } => {
                if options.is_empty() {
                    return Err("enum property declares no options".into());
                }
                if !value.is_empty() && !options.contains(value) {
                    return Err(format!("value `{value}` is not one of its options"));
                }
                Ok(())
            }
            Self::Number {
                min: Some(min),
                max: Some(max),
                ..
            } if min > max => Err(format!("min {min} exceeds max {max}")),
            _ => Ok(()),
        }
    }
}
