use form_model::{FieldId, FieldType, FormDocument, SectionId, SequentialIds};
use form_mutation::{
    apply_batch, delete_fields, reorder_fields, reorder_sections, FieldInput, MutationCommand,
    MutationError, SectionInput,
};
use form_test_utils::{arb_document, arb_field_type};
use proptest::prelude::*;
use std::collections::HashSet;

fn assert_unique_ids(doc: &FormDocument) {
    let sections: HashSet<_> = doc.section_ids().into_iter().collect();
    assert_eq!(sections.len(), doc.section_count());
    let fields: HashSet<_> = doc.fields().map(|f| f.id.clone()).collect();
    assert_eq!(fields.len(), doc.field_count());
}

/// Document plus a permutation of its first section's field ids
fn doc_with_permutation() -> impl Strategy<Value = (FormDocument, Vec<FieldId>)> {
    arb_document().prop_flat_map(|doc| {
        let ids = doc.sections()[0].element_ids();
        (Just(doc), Just(ids).prop_shuffle())
    })
}

fn arb_command() -> impl Strategy<Value = MutationCommand> {
    let section = (0..6usize).prop_map(|i| SectionId::new(format!("s{i}")));
    let field_id = (0..30usize).prop_map(|i| FieldId::new(format!("f{i}")));
    prop_oneof![
        (section.clone(), proptest::collection::vec(arb_field_type(), 1..3), proptest::option::of(field_id.clone()))
            .prop_map(|(section_id, types, anchor)| MutationCommand::AddElementsToSection {
                section_id,
                elements: types.into_iter().map(FieldInput::new).collect(),
                insert_after_field_id: anchor,
            }),
        (proptest::option::of(section.clone()), proptest::option::of(section.clone()))
            .prop_map(|(id, anchor)| MutationCommand::CreateSection {
                section: SectionInput {
                    id,
                    title: "New".into(),
                    description: None,
                    elements: vec![FieldInput::new(FieldType::TextField).with_id("f1")],
                },
                insert_after_section_id: anchor,
            }),
        proptest::collection::vec(field_id, 0..4)
            .prop_map(|field_ids| MutationCommand::DeleteFields { field_ids }),
    ]
}

proptest! {
    #[test]
    fn prop_permutations_reorder_exactly((doc, order) in doc_with_permutation()) {
        let section_id = doc.sections()[0].id.clone();
        let next = reorder_fields(&doc, &section_id, &order).unwrap();
        prop_assert_eq!(next.sections()[0].element_ids(), order);
        prop_assert_eq!(next.field_count(), doc.field_count());
    }

    #[test]
    fn prop_non_permutations_are_rejected(doc in arb_document(), extra in "[a-z]{3}") {
        let section_id = doc.sections()[0].id.clone();
        let mut order = doc.sections()[0].element_ids();
        order.push(FieldId::new(format!("x-{extra}")));
        let before = doc.clone();

        let result = reorder_fields(&doc, &section_id, &order);
        let is_mismatch = matches!(result, Err(MutationError::ReorderSetMismatch { .. }));
        prop_assert!(is_mismatch);
        prop_assert_eq!(doc, before);
    }

    #[test]
    fn prop_dropping_a_section_is_not_a_permutation(doc in arb_document()) {
        let mut ids = doc.section_ids();
        ids.pop();
        let result = reorder_sections(&doc, &ids);
        let is_mismatch = matches!(result, Err(MutationError::ReorderSetMismatch { .. }));
        prop_assert!(is_mismatch);
    }

    #[test]
    fn prop_delete_is_idempotent(doc in arb_document(), picks in proptest::collection::vec(0..40usize, 0..8)) {
        let ids: Vec<FieldId> = picks.into_iter().map(|i| FieldId::new(format!("f{i}"))).collect();
        let once = delete_fields(&doc, &ids).unwrap();
        let twice = delete_fields(&once, &ids).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert!(ids.iter().all(|id| !once.contains_field(id)));
    }

    #[test]
    fn prop_commands_preserve_uniqueness(
        doc in arb_document(),
        commands in proptest::collection::vec(arb_command(), 1..8),
    ) {
        let mut ids = SequentialIds::new();
        let mut current = doc;
        for command in &commands {
            if let Ok(next) = command.apply(&current, &mut ids) {
                assert_unique_ids(&next);
                current = next;
            }
        }
    }

    #[test]
    fn prop_failed_batch_changes_nothing(doc in arb_document()) {
        let before = doc.clone();
        let commands = vec![
            MutationCommand::DeleteFields { field_ids: vec![FieldId::new("f1")] },
            MutationCommand::UpdateField {
                field_id: FieldId::new("missing"),
                updates: form_mutation::FieldUpdate::default(),
            },
        ];
        let result = apply_batch(&doc, &commands, &mut SequentialIds::new());
        prop_assert!(result.is_err());
        prop_assert_eq!(doc, before);
    }
}

#[test]
fn scenario_reorder_sections() {
    let doc = FormDocument::new(vec![
        form_test_utils::section("A", "A", Vec::new()),
        form_test_utils::section("B", "B", Vec::new()),
    ])
    .unwrap();

    let next = reorder_sections(&doc, &[SectionId::new("B"), SectionId::new("A")]).unwrap();
    assert_eq!(next.section_ids(), vec![SectionId::new("B"), SectionId::new("A")]);

    let result = reorder_sections(&doc, &[SectionId::new("A")]);
    assert!(matches!(result, Err(MutationError::ReorderSetMismatch { .. })));
}
