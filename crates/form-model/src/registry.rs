//! Field type registry
//!
//! Fixed mapping from [`FieldType`] to a capability bundle. The lookup is an
//! exhaustive match, so adding a type tag without a registry entry does not
//! compile.

use crate::field::{FieldInstance, FieldKind, FieldType};
use crate::ids::FieldId;
use crate::rules::{self, FieldIssue, Rule};
use serde::{Deserialize, Serialize};

/// Whether a field carries a submitted value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    /// Carries a value and a meaningful `required` flag
    Interactive,
    /// Display only; always valid, never submitted
    Presentational,
}

/// Registry entry for one field type
#[derive(Debug)]
pub struct FieldTypeDefinition {
    pub field_type: FieldType,
    pub category: FieldCategory,
    pub display_name: &'static str,
    rule: Rule,
}

impl FieldTypeDefinition {
    /// Default-attributed instance with the given id
    #[inline]
    #[must_use]
    pub fn construct(&self, id: FieldId) -> FieldInstance {
        FieldInstance::new(id, FieldKind::defaults(self.field_type))
    }

    /// Pure, total validation of a raw submitted value
    #[inline]
    #[must_use]
    pub fn validate(&self, instance: &FieldInstance, raw: &str) -> bool {
        self.check(instance, raw).is_ok()
    }

    /// Validation with the reason for rejection
    ///
    /// # Errors
    /// The [`FieldIssue`] describing why `raw` is not acceptable
    pub fn check(&self, instance: &FieldInstance, raw: &str) -> Result<(), FieldIssue> {
        (self.rule)(instance.kind.is_required(), raw)
    }

    /// True for value-carrying types
    #[inline]
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.category == FieldCategory::Interactive
    }
}

static TEXT_FIELD: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::TextField,
    category: FieldCategory::Interactive,
    display_name: "Text Field",
    rule: rules::non_empty,
};

static NUMBER: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::Number,
    category: FieldCategory::Interactive,
    display_name: "Number",
    rule: rules::number,
};

static TEXT_AREA: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::TextArea,
    category: FieldCategory::Interactive,
    display_name: "Text Area",
    rule: rules::non_empty,
};

static DATE: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::Date,
    category: FieldCategory::Interactive,
    display_name: "Date",
    // Format is left to the input surface
    rule: rules::non_empty,
};

static CHECKBOX: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::Checkbox,
    category: FieldCategory::Interactive,
    display_name: "Checkbox",
    rule: rules::checkbox,
};

static SELECT: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::Select,
    category: FieldCategory::Interactive,
    display_name: "Select",
    rule: rules::non_empty,
};

static PHONE: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::Phone,
    category: FieldCategory::Interactive,
    display_name: "Phone",
    rule: rules::phone,
};

static HEADING: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::Heading,
    category: FieldCategory::Presentational,
    display_name: "Heading",
    rule: rules::always,
};

static RICH_TEXT: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::RichText,
    category: FieldCategory::Presentational,
    display_name: "Rich Text",
    rule: rules::always,
};

static YES_NO: FieldTypeDefinition = FieldTypeDefinition {
    field_type: FieldType::YesNo,
    category: FieldCategory::Interactive,
    display_name: "Yes / No",
    rule: rules::yes_no,
};

/// Registry lookup
#[must_use]
pub fn definition(field_type: FieldType) -> &'static FieldTypeDefinition {
    match field_type {
        FieldType::TextField => &TEXT_FIELD,
        FieldType::Number => &NUMBER,
        FieldType::TextArea => &TEXT_AREA,
        FieldType::Date => &DATE,
        FieldType::Checkbox => &CHECKBOX,
        FieldType::Select => &SELECT,
        FieldType::Phone => &PHONE,
        FieldType::Heading => &HEADING,
        FieldType::RichText => &RICH_TEXT,
        FieldType::YesNo => &YES_NO,
    }
}

/// Registry lookup by wire tag
///
/// # Errors
/// `UnknownFieldType` for tags outside the closed set
pub fn lookup(tag: &str) -> Result<&'static FieldTypeDefinition, crate::ModelError> {
    tag.parse::<FieldType>().map(definition)
}

/// All registry entries, in registry order
pub fn definitions() -> impl Iterator<Item = &'static FieldTypeDefinition> {
    FieldType::ALL.into_iter().map(definition)
}
