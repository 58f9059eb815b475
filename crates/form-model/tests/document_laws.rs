use form_model::{EncodedDocument, FieldId, FieldInstance, FieldKind, FieldType};
use form_test_utils::{arb_document, arb_field_type};
use proptest::prelude::*;
use serde_json::{json, Map};

proptest! {
    #[test]
    fn prop_encoding_round_trips(doc in arb_document()) {
        let encoded = EncodedDocument::encode(&doc).unwrap();
        let decoded = encoded.decode().unwrap();
        prop_assert_eq!(&decoded, &doc);

        // Re-encoding is byte-identical
        let again = EncodedDocument::encode(&decoded).unwrap();
        prop_assert_eq!(again, encoded);
    }

    #[test]
    fn prop_default_instances_accept_empty_iff_not_required(ty in arb_field_type()) {
        let instance = FieldInstance::construct(ty, FieldId::new("f"));
        if instance.is_interactive() {
            prop_assert_eq!(instance.validate(""), !instance.kind.is_required());
        } else {
            prop_assert!(instance.validate(""));
        }
    }
}

#[test]
fn construct_round_trips_through_serialization() {
    for ty in FieldType::ALL {
        let instance = FieldInstance::construct(ty, FieldId::new("x"));
        let json = serde_json::to_string(&instance).unwrap();
        let back: FieldInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, instance);
    }
}

#[test]
fn required_fields_accept_whitespace_as_a_value() {
    let mut required = Map::new();
    required.insert("required".into(), json!(true));

    for ty in [FieldType::TextField, FieldType::TextArea, FieldType::Select, FieldType::Date] {
        let kind = FieldKind::with_overrides(ty, &required).unwrap();
        let instance = FieldInstance::new(FieldId::new("f"), kind);
        assert!(instance.validate("   "), "{ty} should accept whitespace");
        assert!(!instance.validate(""), "{ty} should reject the empty string");
    }
}
