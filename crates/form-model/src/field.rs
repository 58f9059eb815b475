//! Field types and their type-specific attributes
//!
//! A field's attribute shape is determined entirely by its type, so the
//! attributes live inside the [`FieldKind`] variant rather than in a loose
//! map. On the wire a field is `{ id, type, extraAttributes }`; decoding
//! fills attributes missing from `extraAttributes` with the type's defaults
//! and rejects keys the type does not know.

use crate::error::ModelError;
use crate::ids::FieldId;
use crate::registry::{self, FieldCategory, FieldTypeDefinition};
use crate::rules::FieldIssue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Closed set of field type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldType {
    TextField,
    Number,
    TextArea,
    Date,
    Checkbox,
    Select,
    Phone,
    Heading,
    RichText,
    YesNo,
}

impl FieldType {
    /// Every registered type, in registry order
    pub const ALL: [Self; 10] = [
        Self::TextField,
        Self::Number,
        Self::TextArea,
        Self::Date,
        Self::Checkbox,
        Self::Select,
        Self::Phone,
        Self::Heading,
        Self::RichText,
        Self::YesNo,
    ];

    /// Wire tag
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextField => "TextField",
            Self::Number => "Number",
            Self::TextArea => "TextArea",
            Self::Date => "Date",
            Self::Checkbox => "Checkbox",
            Self::Select => "Select",
            Self::Phone => "Phone",
            Self::Heading => "Heading",
            Self::RichText => "RichText",
            Self::YesNo => "YesNo",
        }
    }

    /// Registry entry for this type
    #[inline]
    #[must_use]
    pub fn definition(self) -> &'static FieldTypeDefinition {
        registry::definition(self)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::UnknownFieldType(s.to_string()))
    }
}

/// Attributes of single-line inputs (TextField, Number, Phone)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InputAttributes {
    pub label: String,
    pub helper_text: String,
    pub required: bool,
    pub placeholder: String,
}

impl InputAttributes {
    fn with_defaults(label: &str, placeholder: &str) -> Self {
        Self {
            label: label.to_string(),
            helper_text: String::new(),
            required: false,
            placeholder: placeholder.to_string(),
        }
    }
}

/// Attributes of multi-line text areas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TextAreaAttributes {
    pub label: String,
    pub helper_text: String,
    pub required: bool,
    pub placeholder: String,
    pub rows: u8,
}

/// Attributes of dropdown selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectAttributes {
    pub label: String,
    pub helper_text: String,
    pub required: bool,
    pub placeholder: String,
    pub options: Vec<String>,
}

/// Attributes shared by Date, Checkbox and YesNo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BasicAttributes {
    pub label: String,
    pub helper_text: String,
    pub required: bool,
}

impl BasicAttributes {
    fn with_label(label: &str) -> Self {
        Self {
            label: label.to_string(),
            helper_text: String::new(),
            required: false,
        }
    }
}

/// Horizontal alignment of a heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Attributes of section headings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeadingAttributes {
    pub title: String,
    pub level: u8,
    pub align: Align,
}

/// Attributes of rich text blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RichTextAttributes {
    pub content: String,
}

/// A field type together with its typed attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    TextField(InputAttributes),
    Number(InputAttributes),
    TextArea(TextAreaAttributes),
    Date(BasicAttributes),
    Checkbox(BasicAttributes),
    Select(SelectAttributes),
    Phone(InputAttributes),
    Heading(HeadingAttributes),
    RichText(RichTextAttributes),
    YesNo(BasicAttributes),
}

impl FieldKind {
    /// Default attributes for a freshly added field of `field_type`
    ///
    /// Deterministic: every call returns the same value.
    #[must_use]
    pub fn defaults(field_type: FieldType) -> Self {
        match field_type {
            FieldType::TextField => {
                Self::TextField(InputAttributes::with_defaults("Text field", "Value here..."))
            }
            FieldType::Number => Self::Number(InputAttributes::with_defaults("Number field", "0")),
            FieldType::TextArea => Self::TextArea(TextAreaAttributes {
                label: "Text area".to_string(),
                helper_text: String::new(),
                required: false,
                placeholder: "Value here...".to_string(),
                rows: 3,
            }),
            FieldType::Date => Self::Date(BasicAttributes::with_label("Date field")),
            FieldType::Checkbox => Self::Checkbox(BasicAttributes::with_label("Checkbox field")),
            FieldType::Select => Self::Select(SelectAttributes {
                label: "Select field".to_string(),
                helper_text: String::new(),
                required: false,
                placeholder: "Select an option".to_string(),
                options: vec!["Option 1".to_string(), "Option 2".to_string()],
            }),
            FieldType::Phone => {
                Self::Phone(InputAttributes::with_defaults("Phone number", "+1 555 123 4567"))
            }
            FieldType::Heading => Self::Heading(HeadingAttributes {
                title: "Heading".to_string(),
                level: 2,
                align: Align::Left,
            }),
            FieldType::RichText => Self::RichText(RichTextAttributes {
                content: String::new(),
            }),
            FieldType::YesNo => Self::YesNo(BasicAttributes::with_label("Yes / No")),
        }
    }

    /// Type tag of this kind
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::TextField(_) => FieldType::TextField,
            Self::Number(_) => FieldType::Number,
            Self::TextArea(_) => FieldType::TextArea,
            Self::Date(_) => FieldType::Date,
            Self::Checkbox(_) => FieldType::Checkbox,
            Self::Select(_) => FieldType::Select,
            Self::Phone(_) => FieldType::Phone,
            Self::Heading(_) => FieldType::Heading,
            Self::RichText(_) => FieldType::RichText,
            Self::YesNo(_) => FieldType::YesNo,
        }
    }

    /// Whether a value must be supplied (always false for presentational kinds)
    #[must_use]
    pub fn is_required(&self) -> bool {
        match self {
            Self::TextField(a) | Self::Number(a) | Self::Phone(a) => a.required,
            Self::TextArea(a) => a.required,
            Self::Select(a) => a.required,
            Self::Date(a) | Self::Checkbox(a) | Self::YesNo(a) => a.required,
            Self::Heading(_) | Self::RichText(_) => false,
        }
    }

    /// Human-facing label, if the kind has one
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::TextField(a) | Self::Number(a) | Self::Phone(a) => Some(&a.label),
            Self::TextArea(a) => Some(&a.label),
            Self::Select(a) => Some(&a.label),
            Self::Date(a) | Self::Checkbox(a) | Self::YesNo(a) => Some(&a.label),
            Self::Heading(a) => Some(&a.title),
            Self::RichText(_) => None,
        }
    }

    /// Attributes as a JSON object (the `extraAttributes` wire form)
    #[must_use]
    pub fn attributes(&self) -> Map<String, Value> {
        let value = match self {
            Self::TextField(a) | Self::Number(a) | Self::Phone(a) => serde_json::to_value(a),
            Self::TextArea(a) => serde_json::to_value(a),
            Self::Select(a) => serde_json::to_value(a),
            Self::Date(a) | Self::Checkbox(a) | Self::YesNo(a) => serde_json::to_value(a),
            Self::Heading(a) => serde_json::to_value(a),
            Self::RichText(a) => serde_json::to_value(a),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Decode a complete attribute object for `field_type`
    ///
    /// # Errors
    /// `InvalidAttributes` if keys are missing, unknown, mistyped or out of range
    pub fn from_attributes(
        field_type: FieldType,
        attributes: Map<String, Value>,
    ) -> Result<Self, ModelError> {
        let value = Value::Object(attributes);
        let kind = match field_type {
            FieldType::TextField => Self::TextField(decode(field_type, value)?),
            FieldType::Number => Self::Number(decode(field_type, value)?),
            FieldType::TextArea => Self::TextArea(decode(field_type, value)?),
            FieldType::Date => Self::Date(decode(field_type, value)?),
            FieldType::Checkbox => Self::Checkbox(decode(field_type, value)?),
            FieldType::Select => Self::Select(decode(field_type, value)?),
            FieldType::Phone => Self::Phone(decode(field_type, value)?),
            FieldType::Heading => Self::Heading(decode(field_type, value)?),
            FieldType::RichText => Self::RichText(decode(field_type, value)?),
            FieldType::YesNo => Self::YesNo(decode(field_type, value)?),
        };
        kind.check_ranges()?;
        Ok(kind)
    }

    /// Defaults of `field_type` shallowly overridden by `overrides`
    ///
    /// # Errors
    /// `InvalidAttributes` if an override does not fit the type's schema
    pub fn with_overrides(
        field_type: FieldType,
        overrides: &Map<String, Value>,
    ) -> Result<Self, ModelError> {
        Self::defaults(field_type).merged(overrides)
    }

    /// This kind's attributes shallowly overridden by `overrides`
    ///
    /// # Errors
    /// `InvalidAttributes` if an override does not fit the type's schema
    pub fn merged(&self, overrides: &Map<String, Value>) -> Result<Self, ModelError> {
        let mut attributes = self.attributes();
        for (key, value) in overrides {
            attributes.insert(key.clone(), value.clone());
        }
        Self::from_attributes(self.field_type(), attributes)
    }

    /// Rebuild as `target` type
    ///
    /// Starts from the target's defaults and carries every attribute whose
    /// key exists in both schemas (label, helper text, required, ...).
    ///
    /// # Errors
    /// `InvalidAttributes` if a carried value is out of range for the target
    pub fn converted(&self, target: FieldType) -> Result<Self, ModelError> {
        if target == self.field_type() {
            return Ok(self.clone());
        }
        let current = self.attributes();
        let mut attributes = Self::defaults(target).attributes();
        for (key, slot) in &mut attributes {
            if let Some(value) = current.get(key) {
                *slot = value.clone();
            }
        }
        Self::from_attributes(target, attributes)
    }

    fn check_ranges(&self) -> Result<(), ModelError> {
        match self {
            Self::Heading(a) if !(1..=6).contains(&a.level) => Err(ModelError::invalid_attributes(
                FieldType::Heading,
                format!("level must be between 1 and 6, got {}", a.level),
            )),
            Self::TextArea(a) if a.rows == 0 => Err(ModelError::invalid_attributes(
                FieldType::TextArea,
                "rows must be at least 1",
            )),
            _ => Ok(()),
        }
    }
}

fn decode<T: DeserializeOwned>(field_type: FieldType, value: Value) -> Result<T, ModelError> {
    serde_json::from_value(value).map_err(|e| ModelError::invalid_attributes(field_type, e.to_string()))
}

/// One concrete field placed in a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawField", into = "RawField")]
pub struct FieldInstance {
    pub id: FieldId,
    pub kind: FieldKind,
}

impl FieldInstance {
    /// Create instance from id and kind
    #[inline]
    #[must_use]
    pub fn new(id: FieldId, kind: FieldKind) -> Self {
        Self { id, kind }
    }

    /// Default-attributed instance of `field_type`
    #[inline]
    #[must_use]
    pub fn construct(field_type: FieldType, id: FieldId) -> Self {
        field_type.definition().construct(id)
    }

    /// Type tag
    #[inline]
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    /// Registry entry for this instance's type
    #[inline]
    #[must_use]
    pub fn definition(&self) -> &'static FieldTypeDefinition {
        registry::definition(self.field_type())
    }

    /// True for fields that carry a submitted value
    #[inline]
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.definition().category == FieldCategory::Interactive
    }

    /// Whether `raw` is an acceptable value for this field
    #[inline]
    #[must_use]
    pub fn validate(&self, raw: &str) -> bool {
        self.definition().validate(self, raw)
    }

    /// Like [`validate`](Self::validate) but reports why a value is rejected
    ///
    /// # Errors
    /// The issue an inline message should describe
    #[inline]
    pub fn check(&self, raw: &str) -> Result<(), FieldIssue> {
        self.definition().check(self, raw)
    }

    /// Same field under a different id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: FieldId) -> Self {
        self.id = id;
        self
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    id: FieldId,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    extra_attributes: Map<String, Value>,
}

impl TryFrom<RawField> for FieldInstance {
    type Error = ModelError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let field_type: FieldType = raw.field_type.parse()?;
        let kind = FieldKind::with_overrides(field_type, &raw.extra_attributes)?;
        Ok(Self { id: raw.id, kind })
    }
}

impl From<FieldInstance> for RawField {
    fn from(field: FieldInstance) -> Self {
        Self {
            id: field.id,
            field_type: field.kind.field_type().as_str().to_string(),
            extra_attributes: field.kind.attributes(),
        }
    }
}
