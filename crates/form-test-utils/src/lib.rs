//! Testing utilities for the Formwright workspace
//!
//! Shared fixtures and proptest strategies.

#![allow(missing_docs)]

use form_model::{FieldId, FieldInstance, FieldKind, FieldType, FormDocument, Section, SectionId};
use form_validation::Answers;
use proptest::prelude::*;
use serde_json::{Map, Value};

pub fn field(id: &str, field_type: FieldType) -> FieldInstance {
    FieldInstance::construct(field_type, FieldId::new(id))
}

pub fn field_with(id: &str, field_type: FieldType, overrides: Value) -> FieldInstance {
    let overrides: Map<String, Value> = match overrides {
        Value::Object(map) => map,
        other => panic!("attribute overrides must be an object, got {other}"),
    };
    let kind = FieldKind::with_overrides(field_type, &overrides).unwrap();
    FieldInstance::new(FieldId::new(id), kind)
}

pub fn required_field(id: &str, field_type: FieldType) -> FieldInstance {
    field_with(id, field_type, serde_json::json!({ "required": true }))
}

pub fn section(id: &str, title: &str, elements: Vec<FieldInstance>) -> Section {
    Section::new(SectionId::new(id), title).with_elements(elements)
}

/// Two-page contact form covering every field type
pub fn contact_form() -> FormDocument {
    FormDocument::new(vec![
        section(
            "about",
            "About you",
            vec![
                field("intro", FieldType::Heading),
                required_field("name", FieldType::TextField),
                field("age", FieldType::Number),
                field("bio", FieldType::TextArea),
                field("dob", FieldType::Date),
            ],
        ),
        section(
            "contact",
            "Contact",
            vec![
                required_field("phone", FieldType::Phone),
                field("country", FieldType::Select),
                field("newsletter", FieldType::Checkbox),
                required_field("consent", FieldType::YesNo),
                field("notes", FieldType::RichText),
            ],
        ),
    ])
    .unwrap()
}

/// Answers that complete [`contact_form`]
pub fn complete_contact_answers() -> Answers {
    answers(&[
        ("name", "Ada Lovelace"),
        ("age", "36"),
        ("phone", "+44 20 7946 0958"),
        ("consent", "yes"),
    ])
}

pub fn answers(pairs: &[(&str, &str)]) -> Answers {
    pairs
        .iter()
        .map(|(id, value)| (FieldId::new(*id), (*value).to_string()))
        .collect()
}

pub fn arb_field_type() -> impl Strategy<Value = FieldType> {
    proptest::sample::select(FieldType::ALL.to_vec())
}

/// Well-formed documents with 1..5 sections of 0..6 default fields
///
/// Field ids are `f1, f2, ...` in document order; section ids `s0, s1, ...`.
pub fn arb_document() -> impl Strategy<Value = FormDocument> {
    proptest::collection::vec(proptest::collection::vec(arb_field_type(), 0..6), 1..5).prop_map(
        |layout| {
            let mut next = 0;
            let sections = layout
                .into_iter()
                .enumerate()
                .map(|(si, types)| {
                    let elements = types
                        .into_iter()
                        .map(|ty| {
                            next += 1;
                            field(&format!("f{next}"), ty)
                        })
                        .collect();
                    Section::new(SectionId::new(format!("s{si}")), format!("Page {si}"))
                        .with_elements(elements)
                })
                .collect();
            FormDocument::new(sections).unwrap()
        },
    )
}
