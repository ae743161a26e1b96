use bson_codec::{
    deserialize, serialize, serialize_with_outcome, DbRef, Error, ObjectId, ObjectIdGenerator,
    OrderedDocument, Value,
};
use proptest::prelude::*;

fn doc(fields: &[(&str, Value)]) -> OrderedDocument {
    fields.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
}

#[test]
fn dbref_round_trips_through_ref_id_document_shape() {
    let id = ObjectIdGenerator::new().generate();
    let d = doc(&[(
        "owner",
        Value::DbRef(DbRef {
            collection: "users".into(),
            id: Box::new(Value::ObjectId(id)),
        }),
    )]);

    let bytes = serialize(&d, false, false).unwrap();
    let back = deserialize(&bytes).unwrap();
    assert_eq!(back, d);
}

#[test]
fn legacy_db_pointer_decodes_to_dbref() {
    // tag 0x0c: namespace string, then a 12-byte ObjectId. No writer path
    // produces this tag; only the decoder is expected to accept it.
    let id = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
    let namespace = b"users\0";
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0u8; 4]); // doc length placeholder
    bytes.push(0x0c);
    bytes.extend_from_slice(b"ptr\0");
    bytes.extend_from_slice(&((namespace.len() as i32).to_le_bytes()));
    bytes.extend_from_slice(namespace);
    bytes.extend_from_slice(&id);
    bytes.push(0x00);
    let len = bytes.len() as i32;
    bytes[0..4].copy_from_slice(&len.to_le_bytes());

    let decoded = deserialize(&bytes).unwrap();
    assert_eq!(
        decoded.get("ptr"),
        Some(&Value::DbRef(DbRef {
            collection: "users".into(),
            id: Box::new(Value::ObjectId(ObjectId::from_bytes(id))),
        }))
    );
}

#[test]
fn dollar_ref_document_without_dollar_id_stays_a_plain_document() {
    let inner = doc(&[("$ref", Value::String("users".into()))]);
    let d = doc(&[("x", Value::Document(inner.clone()))]);
    let bytes = serialize(&d, false, false).unwrap();
    let back = deserialize(&bytes).unwrap();
    assert_eq!(back.get("x"), Some(&Value::Document(inner)));
}

#[test]
fn nested_check_keys_rejects_dollar_prefixed_key_in_subdocument() {
    let inner = doc(&[("$bad", Value::Int32(1))]);
    let d = doc(&[("nested", Value::Document(inner))]);
    assert!(matches!(serialize(&d, true, false), Err(Error::InvalidName(_))));
}

#[test]
fn move_id_only_applies_at_top_level() {
    // A nested document's own "_id" pair must not be reordered even when
    // the top-level call asks for move_id.
    let inner = doc(&[("b", Value::Int32(1)), ("_id", Value::Int32(2))]);
    let d = doc(&[("_id", Value::Int32(9)), ("child", Value::Document(inner.clone()))]);
    let bytes = serialize(&d, false, true).unwrap();
    let back = deserialize(&bytes).unwrap();
    assert_eq!(back.get("child"), Some(&Value::Document(inner)));
}

#[test]
fn duplicate_id_fields_skipped_count_matches_extras() {
    let mut d = OrderedDocument::new();
    d.push("_id", 1i32);
    d.push("a", 2i32);
    d.push("_id", 3i32);
    d.push("_id", 4i32);
    let outcome = serialize_with_outcome(&d, false, true).unwrap();
    assert_eq!(outcome.extra_id_fields_skipped, 2);
    let back = deserialize(&outcome.bytes).unwrap();
    assert_eq!(back.len(), 2); // _id (first) + a
}

#[test]
fn object_id_generator_produces_distinct_ids() {
    let gen = ObjectIdGenerator::new();
    let ids: Vec<ObjectId> = (0..50).map(|_| gen.generate()).collect();
    let mut unique = ids.clone();
    unique.sort_by_key(|id| id.bytes());
    unique.dedup();
    assert_eq!(unique.len(), ids.len(), "generator produced a duplicate id");
}

proptest! {
    #[test]
    fn arbitrary_flat_document_round_trips(
        pairs in prop::collection::vec(
            ("[a-zA-Z][a-zA-Z0-9_]{0,8}", -1_000_000i64..1_000_000i64),
            0..8,
        )
    ) {
        let mut d = OrderedDocument::new();
        for (k, v) in &pairs {
            d.push(k.clone(), *v as i32);
        }
        let bytes = serialize(&d, false, false).unwrap();
        let back = deserialize(&bytes).unwrap();
        prop_assert_eq!(back.len(), d.len());
        for (k, v) in &pairs {
            prop_assert_eq!(back.get(k), Some(&Value::Int32(*v as i32)));
        }
    }

    #[test]
    fn arbitrary_strings_round_trip_through_documents(s in "[\\PC]{0,32}") {
        let d = doc(&[("s", Value::String(s.clone()))]);
        let bytes = serialize(&d, false, false).unwrap();
        let back = deserialize(&bytes).unwrap();
        prop_assert_eq!(back.get("s"), Some(&Value::String(s)));
    }
}
