//! Mutation command surface
//!
//! The closed set of structural commands issued by the builder UI and by
//! the AI collaborator's tool calls. On the wire each command is a JSON
//! object tagged by `type`, with camelCase keys.

use crate::apply;
use crate::error::MutationError;
use form_model::{FieldId, FieldInstance, FieldKind, FieldType, FormDocument, IdSource, SectionId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field as supplied by a command
///
/// The type stays a plain string so an unregistered tag is reported as
/// `UnknownFieldType` during application rather than as a shape failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldInput {
    /// Ignored by insertions (fresh ids are always assigned)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FieldId>,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Overrides on top of the type's defaults
    #[serde(default)]
    pub extra_attributes: Map<String, Value>,
}

impl FieldInput {
    /// Input for a default-attributed field of `field_type`
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            id: None,
            field_type: field_type.as_str().to_string(),
            extra_attributes: Map::new(),
        }
    }

    /// With a caller-chosen id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<FieldId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// With one attribute override
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_attributes.insert(key.into(), value.into());
        self
    }

    /// Build the instance under `id`
    ///
    /// # Errors
    /// `UnknownFieldType` or `InvalidAttributes`
    pub fn build(&self, id: FieldId) -> Result<FieldInstance, MutationError> {
        let field_type: FieldType = self.field_type.parse()?;
        let kind = FieldKind::with_overrides(field_type, &self.extra_attributes)?;
        Ok(FieldInstance::new(id, kind))
    }
}

impl From<&FieldInstance> for FieldInput {
    fn from(field: &FieldInstance) -> Self {
        Self {
            id: Some(field.id.clone()),
            field_type: field.field_type().as_str().to_string(),
            extra_attributes: field.kind.attributes(),
        }
    }
}

/// Section as supplied by a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SectionId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Vec<FieldInput>,
}

impl SectionInput {
    /// Empty section input
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            elements: Vec::new(),
        }
    }

    /// With a caller-chosen id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<SectionId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// With elements
    #[must_use]
    pub fn with_elements(mut self, elements: Vec<FieldInput>) -> Self {
        self.elements = elements;
        self
    }
}

/// Partial update of one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdate {
    /// New type tag; attributes are rebuilt from its defaults
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Shallow-merged into the current attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_attributes: Option<Map<String, Value>>,
}

impl FieldUpdate {
    /// Update that only overrides attributes
    #[must_use]
    pub fn attributes(extra_attributes: Map<String, Value>) -> Self {
        Self {
            field_type: None,
            extra_attributes: Some(extra_attributes),
        }
    }

    /// Update that changes the type
    #[must_use]
    pub fn retype(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type.as_str().to_string()),
            extra_attributes: None,
        }
    }
}

/// One structural command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MutationCommand {
    /// Insert fields into a section, after an anchor or at the end
    #[serde(rename_all = "camelCase")]
    AddElementsToSection {
        section_id: SectionId,
        elements: Vec<FieldInput>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        insert_after_field_id: Option<FieldId>,
    },

    /// Insert a section, after an anchor or at the end
    #[serde(rename_all = "camelCase")]
    CreateSection {
        section: SectionInput,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        insert_after_section_id: Option<SectionId>,
    },

    /// Remove fields wherever they are; unknown ids are ignored
    #[serde(rename_all = "camelCase")]
    DeleteFields { field_ids: Vec<FieldId> },

    /// Merge attribute updates into one field, optionally changing its type
    #[serde(rename_all = "camelCase")]
    UpdateField { field_id: FieldId, updates: FieldUpdate },

    /// Replace every section at once
    #[serde(rename_all = "camelCase")]
    ReplaceForm { sections: Vec<SectionInput> },

    /// Reorder the fields of one section
    #[serde(rename_all = "camelCase")]
    ReorderFields {
        section_id: SectionId,
        field_ids: Vec<FieldId>,
    },

    /// Reorder the sections of the document
    #[serde(rename_all = "camelCase")]
    ReorderSections { section_ids: Vec<SectionId> },
}

impl MutationCommand {
    /// Wire name of the command
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddElementsToSection { .. } => "addElementsToSection",
            Self::CreateSection { .. } => "createSection",
            Self::DeleteFields { .. } => "deleteFields",
            Self::UpdateField { .. } => "updateField",
            Self::ReplaceForm { .. } => "replaceForm",
            Self::ReorderFields { .. } => "reorderFields",
            Self::ReorderSections { .. } => "reorderSections",
        }
    }

    /// Apply to `document`, producing a new document
    ///
    /// # Errors
    /// The command's failure; `document` is never modified
    pub fn apply(
        &self,
        document: &FormDocument,
        ids: &mut dyn IdSource,
    ) -> Result<FormDocument, MutationError> {
        let result = match self {
            Self::AddElementsToSection {
                section_id,
                elements,
                insert_after_field_id,
            } => apply::add_elements_to_section(
                document,
                section_id,
                elements,
                insert_after_field_id.as_ref(),
                ids,
            ),
            Self::CreateSection {
                section,
                insert_after_section_id,
            } => apply::create_section(document, section, insert_after_section_id.as_ref(), ids),
            Self::DeleteFields { field_ids } => apply::delete_fields(document, field_ids),
            Self::UpdateField { field_id, updates } => {
                apply::update_field(document, field_id, updates)
            }
            Self::ReplaceForm { sections } => apply::replace_form(sections, ids),
            Self::ReorderFields {
                section_id,
                field_ids,
            } => apply::reorder_fields(document, section_id, field_ids),
            Self::ReorderSections { section_ids } => apply::reorder_sections(document, section_ids),
        };

        match &result {
            Ok(next) => tracing::debug!(
                command = self.name(),
                sections = next.section_count(),
                fields = next.field_count(),
                "Applied command"
            ),
            Err(e) => tracing::debug!(command = self.name(), error = %e, "Command rejected"),
        }
        result
    }
}
