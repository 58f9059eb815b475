//! Pure structural operations
//!
//! Each operation reads a document and returns a new one; the input is
//! never modified, so a failure leaves the caller's document as it was.
//! Fresh ids come from an [`IdSource`] and are re-drawn on collision.

use crate::command::{FieldInput, FieldUpdate, SectionInput};
use crate::error::MutationError;
use form_model::{FieldId, FieldType, FormDocument, IdSource, Section, SectionId};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Draws per fresh id before giving up on the [`IdSource`]
const MAX_ID_DRAWS: usize = 64;

/// Fresh-id allocator that never hands out an id already in use
struct FreshIds<'a> {
    source: &'a mut dyn IdSource,
    fields: HashSet<FieldId>,
    sections: HashSet<SectionId>,
}

impl<'a> FreshIds<'a> {
    fn new(source: &'a mut dyn IdSource) -> Self {
        Self {
            source,
            fields: HashSet::new(),
            sections: HashSet::new(),
        }
    }

    fn reserving(source: &'a mut dyn IdSource, document: &FormDocument) -> Self {
        let mut fresh = Self::new(source);
        fresh.fields.extend(document.fields().map(|f| f.id.clone()));
        fresh.sections.extend(document.section_ids());
        fresh
    }

    fn field(&mut self) -> Result<FieldId, MutationError> {
        for _ in 0..MAX_ID_DRAWS {
            let id = self.source.next_field_id();
            if !id.is_empty() && self.fields.insert(id.clone()) {
                return Ok(id);
            }
        }
        Err(MutationError::IdSourceExhausted { draws: MAX_ID_DRAWS })
    }

    fn section(&mut self) -> Result<SectionId, MutationError> {
        for _ in 0..MAX_ID_DRAWS {
            let id = self.source.next_section_id();
            if !id.is_empty() && self.sections.insert(id.clone()) {
                return Ok(id);
            }
        }
        Err(MutationError::IdSourceExhausted { draws: MAX_ID_DRAWS })
    }
}

fn build_fresh(
    elements: &[FieldInput],
    fresh: &mut FreshIds<'_>,
) -> Result<Vec<form_model::FieldInstance>, MutationError> {
    elements.iter().map(|input| input.build(fresh.field()?)).collect()
}

/// Insert fields into a section
///
/// Every element gets a fresh id, even if the caller supplied one. A stale
/// anchor (not in this section) appends at the end.
///
/// # Errors
/// `SectionNotFound`, `UnknownFieldType`, `InvalidAttributes`,
/// `IdSourceExhausted`
pub fn add_elements_to_section(
    document: &FormDocument,
    section_id: &SectionId,
    elements: &[FieldInput],
    insert_after: Option<&FieldId>,
    ids: &mut dyn IdSource,
) -> Result<FormDocument, MutationError> {
    let index = document
        .section_index(section_id)
        .ok_or_else(|| MutationError::SectionNotFound(section_id.clone()))?;

    let mut fresh = FreshIds::reserving(ids, document);
    let new_fields = build_fresh(elements, &mut fresh)?;

    let mut sections = document.sections().to_vec();
    let target = &mut sections[index];
    let at = insert_after
        .and_then(|anchor| target.position(anchor))
        .map_or(target.elements.len(), |pos| pos + 1);
    target.elements.splice(at..at, new_fields);

    Ok(FormDocument::new(sections)?)
}

/// Insert a section
///
/// The section keeps a caller-supplied id when it is non-empty and unused;
/// its elements always get fresh ids. A stale anchor appends at the end.
///
/// # Errors
/// `UnknownFieldType`, `InvalidAttributes`, `IdSourceExhausted`
pub fn create_section(
    document: &FormDocument,
    section: &SectionInput,
    insert_after: Option<&SectionId>,
    ids: &mut dyn IdSource,
) -> Result<FormDocument, MutationError> {
    let mut fresh = FreshIds::reserving(ids, document);
    let section_id = match &section.id {
        Some(id) if !id.is_empty() && fresh.sections.insert(id.clone()) => id.clone(),
        _ => fresh.section()?,
    };
    let elements = build_fresh(&section.elements, &mut fresh)?;

    let mut new_section = Section::new(section_id, section.title.clone()).with_elements(elements);
    new_section.description.clone_from(&section.description);

    let mut sections = document.sections().to_vec();
    let at = insert_after
        .and_then(|anchor| document.section_index(anchor))
        .map_or(sections.len(), |pos| pos + 1);
    sections.insert(at, new_section);

    Ok(FormDocument::new(sections)?)
}

/// Remove fields wherever they are; ids not found are ignored
///
/// # Errors
/// Never fails for a well-formed document
pub fn delete_fields(
    document: &FormDocument,
    field_ids: &[FieldId],
) -> Result<FormDocument, MutationError> {
    let doomed: HashSet<&FieldId> = field_ids.iter().collect();
    let sections = document
        .sections()
        .iter()
        .cloned()
        .map(|mut section| {
            section.elements.retain(|f| !doomed.contains(&f.id));
            section
        })
        .collect();
    Ok(FormDocument::new(sections)?)
}

/// Merge a partial update into one field
///
/// A type change rebuilds the attributes from the new type's defaults,
/// carrying keys present in both schemas, before the attribute overrides
/// are merged.
///
/// # Errors
/// `FieldNotFound`, `UnknownFieldType`, `InvalidAttributes`
pub fn update_field(
    document: &FormDocument,
    field_id: &FieldId,
    updates: &FieldUpdate,
) -> Result<FormDocument, MutationError> {
    let (si, ei) = document
        .locate_field(field_id)
        .ok_or_else(|| MutationError::FieldNotFound(field_id.clone()))?;
    let current = &document.sections()[si].elements[ei];

    let mut kind = match &updates.field_type {
        Some(tag) => current.kind.converted(tag.parse::<FieldType>()?)?,
        None => current.kind.clone(),
    };
    if let Some(overrides) = &updates.extra_attributes {
        kind = kind.merged(overrides)?;
    }

    let mut sections = document.sections().to_vec();
    sections[si].elements[ei].kind = kind;
    Ok(FormDocument::new(sections)?)
}

/// Reorder the fields of one section
///
/// # Errors
/// `SectionNotFound`, or `ReorderSetMismatch` unless `field_ids` is exactly
/// a permutation of the section's element ids
pub fn reorder_fields(
    document: &FormDocument,
    section_id: &SectionId,
    field_ids: &[FieldId],
) -> Result<FormDocument, MutationError> {
    let index = document
        .section_index(section_id)
        .ok_or_else(|| MutationError::SectionNotFound(section_id.clone()))?;
    let section = &document.sections()[index];
    check_permutation(&section.element_ids(), field_ids)?;

    let mut by_id: HashMap<&FieldId, &form_model::FieldInstance> =
        section.elements.iter().map(|f| (&f.id, f)).collect();
    let reordered = field_ids
        .iter()
        .filter_map(|id| by_id.remove(id).cloned())
        .collect();

    let mut sections = document.sections().to_vec();
    sections[index].elements = reordered;
    Ok(FormDocument::new(sections)?)
}

/// Reorder the sections of the document
///
/// # Errors
/// `ReorderSetMismatch` unless `section_ids` is exactly a permutation of
/// the document's section ids
pub fn reorder_sections(
    document: &FormDocument,
    section_ids: &[SectionId],
) -> Result<FormDocument, MutationError> {
    check_permutation(&document.section_ids(), section_ids)?;

    let mut by_id: HashMap<&SectionId, &Section> =
        document.sections().iter().map(|s| (&s.id, s)).collect();
    let reordered = section_ids
        .iter()
        .filter_map(|id| by_id.remove(id).cloned())
        .collect();
    Ok(FormDocument::new(reordered)?)
}

/// Replace the whole document
///
/// Supplied ids are kept; missing or empty ids are generated. The result
/// is checked as a whole before anything is returned.
///
/// # Errors
/// `EmptyDocument`, `DuplicateId`, `UnknownFieldType`, `InvalidAttributes`,
/// `IdSourceExhausted`
pub fn replace_form(
    sections: &[SectionInput],
    ids: &mut dyn IdSource,
) -> Result<FormDocument, MutationError> {
    if sections.is_empty() {
        return Err(MutationError::EmptyDocument);
    }

    let mut fresh = FreshIds::new(ids);
    for section in sections {
        fresh.sections.extend(supplied(section.id.as_ref()));
        fresh
            .fields
            .extend(section.elements.iter().filter_map(|f| supplied(f.id.as_ref())));
    }

    let mut built = Vec::with_capacity(sections.len());
    for input in sections {
        let id = match supplied(input.id.as_ref()) {
            Some(id) => id,
            None => fresh.section()?,
        };
        let mut elements = Vec::with_capacity(input.elements.len());
        for field in &input.elements {
            let field_id = match supplied(field.id.as_ref()) {
                Some(id) => id,
                None => fresh.field()?,
            };
            elements.push(field.build(field_id)?);
        }
        let mut section = Section::new(id, input.title.clone()).with_elements(elements);
        section.description.clone_from(&input.description);
        built.push(section);
    }

    Ok(FormDocument::new(built)?)
}

fn supplied<T: Clone + AsRef<str>>(id: Option<&T>) -> Option<T> {
    id.filter(|id| !id.as_ref().is_empty()).cloned()
}

/// Exact-permutation check (no missing, extra or repeated ids)
fn check_permutation<T>(current: &[T], proposed: &[T]) -> Result<(), MutationError>
where
    T: Eq + Hash + Clone + ToString,
{
    let known: HashSet<&T> = current.iter().collect();
    let mut seen = HashSet::with_capacity(proposed.len());
    let unexpected: Vec<T> = proposed
        .iter()
        .filter(|id| !known.contains(id) || !seen.insert(*id))
        .cloned()
        .collect();
    let missing: Vec<T> = current
        .iter()
        .filter(|id| !seen.contains(id))
        .cloned()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(MutationError::reorder_mismatch(&missing, &unexpected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_model::{FieldInstance, FieldKind, SequentialIds};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map, Value};

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn field(id: &str, ty: FieldType) -> FieldInstance {
        FieldInstance::construct(ty, FieldId::new(id))
    }

    fn two_sections() -> FormDocument {
        FormDocument::new(vec![
            Section::new(SectionId::new("A"), "First").with_elements(vec![
                field("a1", FieldType::TextField),
                field("a2", FieldType::Checkbox),
                field("a3", FieldType::Number),
            ]),
            Section::new(SectionId::new("B"), "Second")
                .with_elements(vec![field("b1", FieldType::Phone)]),
        ])
        .unwrap()
    }

    fn ids_of(doc: &FormDocument, section: usize) -> Vec<&str> {
        doc.sections()[section]
            .elements
            .iter()
            .map(|f| f.id.as_str())
            .collect()
    }

    #[test]
    fn add_to_empty_section() {
        let doc = FormDocument::blank(SectionId::new("S1"));
        let input = FieldInput::new(FieldType::TextField)
            .with_attribute("label", "Name")
            .with_attribute("required", true);

        let next = add_elements_to_section(
            &doc,
            &SectionId::new("S1"),
            &[input],
            None,
            &mut SequentialIds::new(),
        )
        .unwrap();

        let elements = &next.sections()[0].elements;
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].field_type(), FieldType::TextField);
        assert!(elements[0].kind.is_required());
        assert_eq!(elements[0].kind.label(), Some("Name"));
    }

    #[test]
    fn add_inserts_after_anchor() {
        let doc = two_sections();
        let next = add_elements_to_section(
            &doc,
            &SectionId::new("A"),
            &[FieldInput::new(FieldType::Date), FieldInput::new(FieldType::YesNo)],
            Some(&FieldId::new("a1")),
            &mut SequentialIds::new(),
        )
        .unwrap();
        assert_eq!(ids_of(&next, 0), vec!["a1", "field-1", "field-2", "a2", "a3"]);
    }

    #[test]
    fn stale_anchor_appends() {
        let doc = two_sections();
        // b1 exists, but not in section A
        let next = add_elements_to_section(
            &doc,
            &SectionId::new("A"),
            &[FieldInput::new(FieldType::Date)],
            Some(&FieldId::new("b1")),
            &mut SequentialIds::new(),
        )
        .unwrap();
        assert_eq!(ids_of(&next, 0), vec!["a1", "a2", "a3", "field-1"]);
    }

    #[test]
    fn supplied_ids_are_replaced_and_collisions_redrawn() {
        let doc = FormDocument::new(vec![Section::new(SectionId::new("S"), "S")
            .with_elements(vec![field("field-1", FieldType::Date)])])
        .unwrap();
        let next = add_elements_to_section(
            &doc,
            &SectionId::new("S"),
            &[FieldInput::new(FieldType::Date).with_id("field-1")],
            None,
            &mut SequentialIds::new(),
        )
        .unwrap();
        assert_eq!(ids_of(&next, 0), vec!["field-1", "field-2"]);
    }

    #[test]
    fn add_to_missing_section_fails() {
        let doc = two_sections();
        let result = add_elements_to_section(
            &doc,
            &SectionId::new("Z"),
            &[FieldInput::new(FieldType::Date)],
            None,
            &mut SequentialIds::new(),
        );
        assert_eq!(result, Err(MutationError::SectionNotFound(SectionId::new("Z"))));
    }

    #[test]
    fn add_rejects_unknown_type_and_bad_attributes() {
        let doc = two_sections();
        let unknown = FieldInput {
            id: None,
            field_type: "Signature".into(),
            extra_attributes: Map::new(),
        };
        let result = add_elements_to_section(
            &doc,
            &SectionId::new("A"),
            &[FieldInput::new(FieldType::Date), unknown],
            None,
            &mut SequentialIds::new(),
        );
        assert_eq!(result, Err(MutationError::UnknownFieldType("Signature".into())));

        let bad = FieldInput::new(FieldType::Heading).with_attribute("level", 12);
        let result = add_elements_to_section(
            &doc,
            &SectionId::new("A"),
            &[bad],
            None,
            &mut SequentialIds::new(),
        );
        assert!(matches!(result, Err(MutationError::InvalidAttributes { .. })));
    }

    #[test]
    fn create_section_keeps_unused_id() {
        let doc = two_sections();
        let input = SectionInput::new("Middle")
            .with_id("M")
            .with_elements(vec![FieldInput::new(FieldType::Select).with_id("a1")]);
        let next = create_section(
            &doc,
            &input,
            Some(&SectionId::new("A")),
            &mut SequentialIds::new(),
        )
        .unwrap();

        let order: Vec<_> = next.section_ids().iter().map(ToString::to_string).collect();
        assert_eq!(order, vec!["A", "M", "B"]);
        assert_eq!(ids_of(&next, 1), vec!["field-1"]);
    }

    #[test]
    fn create_section_replaces_taken_id_and_appends_on_stale_anchor() {
        let doc = two_sections();
        let next = create_section(
            &doc,
            &SectionInput::new("Again").with_id("A"),
            Some(&SectionId::new("gone")),
            &mut SequentialIds::new(),
        )
        .unwrap();
        let order: Vec<_> = next.section_ids().iter().map(ToString::to_string).collect();
        assert_eq!(order, vec!["A", "B", "section-1"]);
    }

    #[test]
    fn delete_ignores_unknown_ids() {
        let doc = two_sections();
        let ids = [FieldId::new("a2"), FieldId::new("b1"), FieldId::new("nope")];
        let once = delete_fields(&doc, &ids).unwrap();
        let twice = delete_fields(&once, &ids).unwrap();
        assert_eq!(once, twice);
        assert_eq!(ids_of(&once, 0), vec!["a1", "a3"]);
        assert!(once.sections()[1].elements.is_empty());
    }

    #[test]
    fn update_makes_checkbox_required() {
        let doc = two_sections();
        let updates = FieldUpdate::attributes(object(json!({ "required": true })));
        let next = update_field(&doc, &FieldId::new("a2"), &updates).unwrap();

        let checkbox = next.field(&FieldId::new("a2")).unwrap();
        assert!(!checkbox.validate("false"));
        assert!(checkbox.validate("true"));
        assert!(doc.field(&FieldId::new("a2")).unwrap().validate("false"));
    }

    #[test]
    fn update_with_type_change_carries_shared_attributes() {
        let doc = two_sections();
        let labelled = update_field(
            &doc,
            &FieldId::new("a1"),
            &FieldUpdate::attributes(object(json!({ "label": "Age", "required": true }))),
        )
        .unwrap();

        let updates = FieldUpdate {
            field_type: Some("Number".into()),
            extra_attributes: Some(object(json!({ "placeholder": "years" }))),
        };
        let next = update_field(&labelled, &FieldId::new("a1"), &updates).unwrap();

        let FieldKind::Number(attrs) = &next.field(&FieldId::new("a1")).unwrap().kind else {
            panic!("expected number");
        };
        assert_eq!(attrs.label, "Age");
        assert!(attrs.required);
        assert_eq!(attrs.placeholder, "years");
    }

    #[test]
    fn update_missing_field_fails() {
        let doc = two_sections();
        let result = update_field(&doc, &FieldId::new("zz"), &FieldUpdate::default());
        assert_eq!(result, Err(MutationError::FieldNotFound(FieldId::new("zz"))));
    }

    #[test]
    fn update_rejects_foreign_attribute() {
        let doc = two_sections();
        let updates = FieldUpdate::attributes(object(json!({ "rows": 4 })));
        let result = update_field(&doc, &FieldId::new("a2"), &updates);
        assert!(matches!(
            result,
            Err(MutationError::InvalidAttributes {
                field_type: FieldType::Checkbox,
                ..
            })
        ));
    }

    #[test]
    fn reorder_fields_applies_permutation() {
        let doc = two_sections();
        let order = [FieldId::new("a3"), FieldId::new("a1"), FieldId::new("a2")];
        let next = reorder_fields(&doc, &SectionId::new("A"), &order).unwrap();
        assert_eq!(ids_of(&next, 0), vec!["a3", "a1", "a2"]);
    }

    #[test]
    fn reorder_fields_rejects_non_permutations() {
        let doc = two_sections();
        let cases: [&[&str]; 4] = [
            &["a1", "a2"],
            &["a1", "a2", "a3", "b1"],
            &["a1", "a1", "a2"],
            &["a1", "a2", "x"],
        ];
        for case in cases {
            let ids: Vec<FieldId> = case.iter().map(|s| FieldId::new(*s)).collect();
            let result = reorder_fields(&doc, &SectionId::new("A"), &ids);
            assert!(
                matches!(result, Err(MutationError::ReorderSetMismatch { .. })),
                "{case:?}"
            );
        }
    }

    #[test]
    fn reorder_mismatch_names_offenders() {
        let doc = two_sections();
        let ids = [FieldId::new("a1"), FieldId::new("a1"), FieldId::new("x")];
        let result = reorder_fields(&doc, &SectionId::new("A"), &ids);
        assert_eq!(
            result,
            Err(MutationError::ReorderSetMismatch {
                missing: vec!["a2".into(), "a3".into()],
                unexpected: vec!["a1".into(), "x".into()],
            })
        );
    }

    #[test]
    fn reorder_sections_swaps_and_rejects_subsets() {
        let doc = two_sections();
        let next = reorder_sections(&doc, &[SectionId::new("B"), SectionId::new("A")]).unwrap();
        let order: Vec<_> = next.section_ids().iter().map(ToString::to_string).collect();
        assert_eq!(order, vec!["B", "A"]);

        let result = reorder_sections(&doc, &[SectionId::new("A")]);
        assert!(matches!(result, Err(MutationError::ReorderSetMismatch { .. })));
    }

    #[test]
    fn replace_form_checks_uniqueness_atomically() {
        let sections = vec![
            SectionInput::new("One")
                .with_id("s1")
                .with_elements(vec![FieldInput::new(FieldType::Date).with_id("d")]),
            SectionInput::new("Two")
                .with_id("s2")
                .with_elements(vec![FieldInput::new(FieldType::Date).with_id("d")]),
        ];
        let result = replace_form(&sections, &mut SequentialIds::new());
        assert_eq!(result, Err(MutationError::DuplicateId("d".into())));

        assert_eq!(
            replace_form(&[], &mut SequentialIds::new()),
            Err(MutationError::EmptyDocument)
        );
    }

    #[test]
    fn replace_form_keeps_supplied_ids_and_fills_missing() {
        let sections = vec![SectionInput::new("One").with_elements(vec![
            FieldInput::new(FieldType::Heading).with_id("field-1"),
            FieldInput::new(FieldType::RichText),
        ])];
        let doc = replace_form(&sections, &mut SequentialIds::new()).unwrap();
        assert_eq!(doc.section_ids(), vec![SectionId::new("section-1")]);
        assert_eq!(ids_of(&doc, 0), vec!["field-1", "field-2"]);
    }

    /// Always hands out the same ids
    struct StuckIds;

    impl IdSource for StuckIds {
        fn next_field_id(&mut self) -> FieldId {
            FieldId::new("a1")
        }

        fn next_section_id(&mut self) -> SectionId {
            SectionId::new("")
        }
    }

    #[test]
    fn stuck_id_source_fails_instead_of_looping() {
        let doc = two_sections();
        let exhausted = MutationError::IdSourceExhausted {
            draws: MAX_ID_DRAWS,
        };

        let err = add_elements_to_section(
            &doc,
            &SectionId::new("B"),
            &[FieldInput::new(FieldType::Phone)],
            None,
            &mut StuckIds,
        )
        .unwrap_err();
        assert_eq!(err, exhausted);

        let err = create_section(&doc, &SectionInput::new("Third"), None, &mut StuckIds).unwrap_err();
        assert_eq!(err, exhausted);
    }
}
