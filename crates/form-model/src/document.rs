//! Form document model
//!
//! A [`FormDocument`] is an ordered list of [`Section`]s, each holding an
//! ordered list of [`FieldInstance`]s.
//!
//! # Invariants
//! - At least one section
//! - Section ids are unique within the document
//! - Field ids are unique across the whole document (flat id space)
//!
//! Every constructor checks these, so a `FormDocument` value is always
//! well-formed. Documents are immutable values: structural edits build a
//! new document.

use crate::codec::EncodedDocument;
use crate::error::ModelError;
use crate::field::FieldInstance;
use crate::hash::ContentHash;
use crate::ids::{FieldId, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One page of a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Vec<FieldInstance>,
}

impl Section {
    /// Empty section
    #[inline]
    #[must_use]
    pub fn new(id: SectionId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            elements: Vec::new(),
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With elements
    #[inline]
    #[must_use]
    pub fn with_elements(mut self, elements: Vec<FieldInstance>) -> Self {
        self.elements = elements;
        self
    }

    /// Position of a field within this section
    #[inline]
    #[must_use]
    pub fn position(&self, field_id: &FieldId) -> Option<usize> {
        self.elements.iter().position(|f| &f.id == field_id)
    }

    /// Ids of the elements in order
    #[must_use]
    pub fn element_ids(&self) -> Vec<FieldId> {
        self.elements.iter().map(|f| f.id.clone()).collect()
    }
}

/// The full ordered tree of sections and fields defining a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Section>", into = "Vec<Section>")]
pub struct FormDocument {
    sections: Vec<Section>,
}

impl FormDocument {
    /// Build a document, checking all invariants
    ///
    /// # Errors
    /// - `EmptyDocument` if `sections` is empty
    /// - `DuplicateSectionId` / `DuplicateFieldId` on id collisions
    pub fn new(sections: Vec<Section>) -> Result<Self, ModelError> {
        check_invariants(&sections)?;
        Ok(Self { sections })
    }

    /// Single untitled section, the state of a freshly set-up form
    #[must_use]
    pub fn blank(section_id: SectionId) -> Self {
        Self {
            sections: vec![Section::new(section_id, "Untitled section")],
        }
    }

    /// Sections in page order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Take ownership of the sections
    #[inline]
    #[must_use]
    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    /// Number of sections
    #[inline]
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Section ids in page order
    #[must_use]
    pub fn section_ids(&self) -> Vec<SectionId> {
        self.sections.iter().map(|s| s.id.clone()).collect()
    }

    /// Find section by id
    #[inline]
    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Index of a section
    #[inline]
    #[must_use]
    pub fn section_index(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|s| &s.id == id)
    }

    /// `(section index, element index)` of a field
    #[must_use]
    pub fn locate_field(&self, id: &FieldId) -> Option<(usize, usize)> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(si, s)| s.position(id).map(|ei| (si, ei)))
    }

    /// Find field by id anywhere in the document
    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&FieldInstance> {
        self.locate_field(id)
            .map(|(si, ei)| &self.sections[si].elements[ei])
    }

    /// True if any section holds the field
    #[inline]
    #[must_use]
    pub fn contains_field(&self, id: &FieldId) -> bool {
        self.locate_field(id).is_some()
    }

    /// All fields in document order
    pub fn fields(&self) -> impl Iterator<Item = &FieldInstance> {
        self.sections.iter().flat_map(|s| s.elements.iter())
    }

    /// Value-carrying fields in document order
    pub fn interactive_fields(&self) -> impl Iterator<Item = &FieldInstance> {
        self.fields().filter(|f| f.is_interactive())
    }

    /// Total number of fields
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.elements.len()).sum()
    }

    /// Persisted encoding of this document
    ///
    /// # Errors
    /// Returns error if JSON serialization fails
    #[inline]
    pub fn encode(&self) -> Result<EncodedDocument, ModelError> {
        EncodedDocument::encode(self)
    }

    /// Hash of the persisted encoding (content equality, not identity)
    ///
    /// # Errors
    /// Returns error if JSON serialization fails
    #[inline]
    pub fn content_hash(&self) -> Result<ContentHash, ModelError> {
        Ok(self.encode()?.content_hash())
    }
}

impl TryFrom<Vec<Section>> for FormDocument {
    type Error = ModelError;

    fn try_from(sections: Vec<Section>) -> Result<Self, Self::Error> {
        Self::new(sections)
    }
}

impl From<FormDocument> for Vec<Section> {
    fn from(document: FormDocument) -> Self {
        document.sections
    }
}

/// Check document invariants over a candidate section list
///
/// # Errors
/// First violated invariant
pub fn check_invariants(sections: &[Section]) -> Result<(), ModelError> {
    if sections.is_empty() {
        return Err(ModelError::EmptyDocument);
    }

    let mut section_ids = HashSet::with_capacity(sections.len());
    let mut field_ids = HashSet::new();
    for section in sections {
        if !section_ids.insert(&section.id) {
            return Err(ModelError::DuplicateSectionId(section.id.clone()));
        }
        for field in &section.elements {
            if !field_ids.insert(&field.id) {
                return Err(ModelError::DuplicateFieldId(field.id.clone()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field(id: &str, ty: FieldType) -> FieldInstance {
        FieldInstance::construct(ty, FieldId::new(id))
    }

    fn sample() -> FormDocument {
        FormDocument::new(vec![
            Section::new(SectionId::new("s1"), "About you").with_elements(vec![
                field("name", FieldType::TextField),
                field("intro", FieldType::Heading),
            ]),
            Section::new(SectionId::new("s2"), "Contact")
                .with_description("How to reach you")
                .with_elements(vec![field("phone", FieldType::Phone)]),
        ])
        .unwrap()
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(matches!(
            FormDocument::new(Vec::new()),
            Err(ModelError::EmptyDocument)
        ));
    }

    #[test]
    fn field_ids_are_unique_across_sections() {
        let result = FormDocument::new(vec![
            Section::new(SectionId::new("a"), "A").with_elements(vec![field("x", FieldType::Date)]),
            Section::new(SectionId::new("b"), "B").with_elements(vec![field("x", FieldType::Number)]),
        ]);
        assert!(matches!(result, Err(ModelError::DuplicateFieldId(id)) if id.as_str() == "x"));
    }

    #[test]
    fn section_ids_are_unique() {
        let result = FormDocument::new(vec![
            Section::new(SectionId::new("a"), "A"),
            Section::new(SectionId::new("a"), "Again"),
        ]);
        assert!(matches!(result, Err(ModelError::DuplicateSectionId(_))));
    }

    #[test]
    fn lookups_use_flat_id_space() {
        let doc = sample();
        assert_eq!(doc.locate_field(&FieldId::new("phone")), Some((1, 0)));
        assert_eq!(doc.field(&FieldId::new("intro")).unwrap().field_type(), FieldType::Heading);
        assert!(doc.field(&FieldId::new("missing")).is_none());
        assert_eq!(doc.field_count(), 3);
        assert_eq!(doc.section_index(&SectionId::new("s2")), Some(1));
    }

    #[test]
    fn interactive_fields_skip_presentational() {
        let doc = sample();
        let ids: Vec<_> = doc.interactive_fields().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "phone"]);
    }

    #[test]
    fn serializes_as_section_array() {
        let doc = FormDocument::blank(SectionId::new("s1"));
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!([{ "id": "s1", "title": "Untitled section", "elements": [] }])
        );
    }

    #[test]
    fn round_trip_preserves_order_and_ids() {
        let doc = sample();
        let json = serde_json::to_string(&doc).unwrap();
        let back: FormDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn decoding_checks_invariants() {
        let result: Result<FormDocument, _> = serde_json::from_value(json!([]));
        assert!(result.is_err());
    }

    #[test]
    fn content_hash_tracks_content() {
        let a = sample();
        let b = sample();
        assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());

        let c = FormDocument::blank(SectionId::new("s1"));
        assert_ne!(a.content_hash().unwrap(), c.content_hash().unwrap());
    }
}
