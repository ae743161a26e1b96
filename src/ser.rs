//! BSON document serializer (spec.md §4.3).
//!
//! BSON is a little-endian binary format on every field except the
//! ObjectId's timestamp/process/counter sub-fields (§4.5), which this
//! module never touches directly — it only copies whatever bytes
//! [`crate::value::ObjectId`] already carries.

use crate::buffer::ByteBuffer;
use crate::document::OrderedDocument;
use crate::error::{Error, Result};
use crate::utf8::{classify, Utf8Class};
use crate::value::{Value, BINARY_SUBTYPE_LEGACY};

/// Top-level document size ceiling: 4 MiB (spec §3.3).
pub const MAX_DOCUMENT_SIZE: usize = 4 * 1024 * 1024;

/// Result of [`serialize_with_outcome`]: the encoded bytes, plus whether
/// any duplicate `_id` pair was skipped while moving the first one to the
/// front (`SPEC_FULL.md` §B.1 — the typed stand-in for the warning spec.md
/// §9 asks for, since this crate has no logging dependency of its own).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOutcome {
    pub bytes: Vec<u8>,
    pub extra_id_fields_skipped: usize,
}

/// Encodes `doc` to BSON bytes.
///
/// `check_keys`: reject (recursively) any key starting with `$` or
/// containing `.`. `move_id`: if the top-level document has a pair keyed
/// `_id`, emit it first regardless of position, and skip every other pair
/// keyed `_id` during the main traversal (spec §4.3).
pub fn serialize(doc: &OrderedDocument, check_keys: bool, move_id: bool) -> Result<Vec<u8>> {
    Ok(serialize_with_outcome(doc, check_keys, move_id)?.bytes)
}

/// Like [`serialize`], but also reports how many extra `_id`-keyed pairs
/// were skipped (see [`SerializeOutcome`]).
pub fn serialize_with_outcome(
    doc: &OrderedDocument,
    check_keys: bool,
    move_id: bool,
) -> Result<SerializeOutcome> {
    let mut ctx = Ctx {
        extra_id_fields_skipped: 0,
    };
    let mut buf = ByteBuffer::new();
    write_document(&mut buf, doc, check_keys, move_id, true, &mut ctx)?;
    Ok(SerializeOutcome {
        bytes: buf.release(),
        extra_id_fields_skipped: ctx.extra_id_fields_skipped,
    })
}

struct Ctx {
    extra_id_fields_skipped: usize,
}

fn write_document(
    buf: &mut ByteBuffer,
    doc: &OrderedDocument,
    check_keys: bool,
    move_id: bool,
    top_level: bool,
    ctx: &mut Ctx,
) -> Result<()> {
    let start = buf.position();
    let len_offset = buf.reserve(4)?;

    let mut moved_id_pending_skip = false;
    if move_id {
        if let Some((_, id_value)) = doc.iter().find(|(k, _)| k == "_id") {
            write_element(buf, "_id", id_value, check_keys)?;
            moved_id_pending_skip = true;
        }
    }

    let allow_id = !move_id;
    for (key, value) in doc.iter() {
        if !allow_id && key == "_id" {
            if moved_id_pending_skip {
                // This is the pair already emitted by the move above, not a
                // genuine duplicate — don't count it.
                moved_id_pending_skip = false;
            } else {
                ctx.extra_id_fields_skipped += 1;
            }
            continue;
        }
        write_element(buf, key, value, check_keys)?;
    }

    buf.append(&[0])?;

    let len = (buf.position() - start) as i32;
    buf.patch(len_offset, &len.to_le_bytes());

    if top_level && (buf.position() - start) > MAX_DOCUMENT_SIZE {
        return Err(Error::InvalidDocument(format!(
            "document of {} bytes exceeds the {} byte maximum",
            buf.position() - start,
            MAX_DOCUMENT_SIZE
        )));
    }

    Ok(())
}

fn write_element(buf: &mut ByteBuffer, key: &str, value: &Value, check_keys: bool) -> Result<()> {
    if check_keys {
        validate_key(key)?;
    }
    validate_key_encoding(key)?;

    buf.append(&[tag_of(value)])?;
    write_cstring(buf, key)?;
    write_payload(buf, value, check_keys)
}

fn validate_key(key: &str) -> Result<()> {
    if key.starts_with('$') || key.contains('.') {
        return Err(Error::InvalidName(key.to_owned()));
    }
    Ok(())
}

fn validate_key_encoding(key: &str) -> Result<()> {
    match classify(key.as_bytes(), false) {
        Utf8Class::Ok => Ok(()),
        Utf8Class::HasNull => Err(Error::InvalidDocument(format!(
            "key {key:?} must not contain a NUL byte"
        ))),
        Utf8Class::NotUtf8 => Err(Error::InvalidStringEncoding("document key")),
    }
}

fn tag_of(value: &Value) -> u8 {
    match value {
        Value::Double(_) => 0x01,
        Value::String(_) => 0x02,
        Value::Document(_) => 0x03,
        Value::Array(_) => 0x04,
        Value::Binary(_) => 0x05,
        Value::ObjectId(_) => 0x07,
        Value::Boolean(_) => 0x08,
        Value::DateTime(_) => 0x09,
        Value::Null => 0x0a,
        Value::Regex(_) => 0x0b,
        Value::DbRef(_) => 0x03, // DbRef always writes as a $ref/$id document.
        Value::JavaScript(_) => 0x0d,
        Value::Symbol(_) => 0x0e,
        Value::CodeWithScope(_) => 0x0f,
        Value::Int32(_) => 0x10,
        Value::Timestamp(_) => 0x11,
        Value::Int64(_) => 0x12,
        Value::MinKey => 0xff,
        Value::MaxKey => 0x7f,
    }
}

fn write_payload(buf: &mut ByteBuffer, value: &Value, check_keys: bool) -> Result<()> {
    match value {
        Value::Double(v) => buf.append(&v.to_le_bytes()),
        Value::String(s) => write_string(buf, s, "string value"),
        Value::Document(doc) => {
            let mut ctx = Ctx {
                extra_id_fields_skipped: 0,
            };
            write_document(buf, doc, check_keys, false, false, &mut ctx)
        }
        Value::Array(items) => {
            let doc: OrderedDocument = items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect();
            let mut ctx = Ctx {
                extra_id_fields_skipped: 0,
            };
            write_document(buf, &doc, check_keys, false, false, &mut ctx)
        }
        Value::Binary(bin) => write_binary(buf, bin.subtype, &bin.data),
        Value::ObjectId(id) => buf.append(&id.bytes()),
        Value::Boolean(b) => buf.append(&[if *b { 0x01 } else { 0x00 }]),
        Value::DateTime(ms) => buf.append(&ms.to_le_bytes()),
        Value::Null => Ok(()),
        Value::Regex(regex) => {
            write_cstring_checked(buf, &regex.pattern, "regex pattern")?;
            write_cstring(buf, &regex.flags_string())
        }
        Value::DbRef(dbref) => {
            let mut scope = OrderedDocument::new();
            scope.push("$ref", dbref.collection.clone());
            scope.push("$id", (*dbref.id).clone());
            let mut ctx = Ctx {
                extra_id_fields_skipped: 0,
            };
            write_document(buf, &scope, check_keys, false, false, &mut ctx)
        }
        Value::JavaScript(code) => write_string(buf, code, "javascript code"),
        Value::Symbol(sym) => write_string(buf, sym, "symbol"),
        Value::CodeWithScope(cws) => {
            let len_offset = buf.reserve(4)?;
            write_string(buf, &cws.code, "javascript code")?;
            let mut ctx = Ctx {
                extra_id_fields_skipped: 0,
            };
            write_document(buf, &cws.scope, check_keys, false, false, &mut ctx)?;
            let total_len = (buf.position() - len_offset) as i32;
            buf.patch(len_offset, &total_len.to_le_bytes());
            Ok(())
        }
        Value::Int32(v) => buf.append(&v.to_le_bytes()),
        Value::Timestamp(ts) => {
            buf.append(&ts.increment.to_le_bytes())?;
            buf.append(&ts.seconds.to_le_bytes())
        }
        Value::Int64(v) => buf.append(&v.to_le_bytes()),
        Value::MinKey | Value::MaxKey => Ok(()),
    }
}

/// Writes the legacy-subtype-2 exception: outer length is `raw_len + 4`,
/// then the subtype, then an inner 4-byte length of `raw_len`, then bytes
/// (spec §4.3.1); every other subtype is outer-length + subtype + bytes.
fn write_binary(buf: &mut ByteBuffer, subtype: u8, data: &[u8]) -> Result<()> {
    if subtype == BINARY_SUBTYPE_LEGACY {
        buf.append(&((data.len() as i32) + 4).to_le_bytes())?;
        buf.append(&[subtype])?;
        buf.append(&(data.len() as i32).to_le_bytes())?;
    } else {
        buf.append(&(data.len() as i32).to_le_bytes())?;
        buf.append(&[subtype])?;
    }
    buf.append(data)
}

/// Writes a key as a NUL-terminated C-string. Keys are validated NUL-free
/// by the caller before this runs.
fn write_cstring(buf: &mut ByteBuffer, s: &str) -> Result<()> {
    buf.append(s.as_bytes())?;
    buf.append(&[0])
}

/// Writes a C-string for a field that must itself be NUL-free (regex
/// patterns — keys go through [`validate_key_encoding`] instead).
fn write_cstring_checked(buf: &mut ByteBuffer, s: &str, what: &'static str) -> Result<()> {
    match classify(s.as_bytes(), false) {
        Utf8Class::Ok => write_cstring(buf, s),
        Utf8Class::HasNull => Err(Error::InvalidDocument(format!("{what} must not contain a NUL byte"))),
        Utf8Class::NotUtf8 => Err(Error::InvalidStringEncoding(what)),
    }
}

/// Writes a BSON string: little-endian i32 length (payload + NUL),
/// UTF-8 bytes, NUL. Embedded NUL is permitted in general strings (spec
/// §4.3.1's "historical behavior"), so this validates with `allow_null =
/// true` — only non-UTF-8 input is rejected, and that's unreachable given
/// Rust's `String` guarantee.
fn write_string(buf: &mut ByteBuffer, s: &str, what: &'static str) -> Result<()> {
    if classify(s.as_bytes(), true) == Utf8Class::NotUtf8 {
        return Err(Error::InvalidStringEncoding(what));
    }
    let len = (s.len() as i32) + 1;
    buf.append(&len.to_le_bytes())?;
    buf.append(s.as_bytes())?;
    buf.append(&[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Binary, Regex, Timestamp};

    fn doc(pairs: &[(&str, Value)]) -> OrderedDocument {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
    }

    #[test]
    fn empty_document() {
        let out = serialize(&OrderedDocument::new(), false, false).unwrap();
        assert_eq!(out, vec![0x05, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn scenario_a_is_1() {
        let d = doc(&[("a", Value::Int32(1))]);
        let out = serialize(&d, false, false).unwrap();
        assert_eq!(
            out,
            vec![0x0e, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0x00]
        );
    }

    #[test]
    fn scenario_x_is_hi() {
        let d = doc(&[("x", Value::String("hi".into()))]);
        let out = serialize(&d, false, false).unwrap();
        assert_eq!(
            out,
            vec![0x10, 0, 0, 0, 0x02, b'x', 0, 3, 0, 0, 0, b'h', b'i', 0, 0x00]
        );
    }

    #[test]
    fn check_keys_rejects_dollar_and_dot() {
        let d = doc(&[("$bad", Value::Int32(1))]);
        assert!(matches!(serialize(&d, true, false), Err(Error::InvalidName(_))));

        let d = doc(&[("a.b", Value::Int32(1))]);
        assert!(matches!(serialize(&d, true, false), Err(Error::InvalidName(_))));
    }

    #[test]
    fn move_id_emits_id_first_regardless_of_position() {
        let id = Value::Int32(7);
        let front = doc(&[("_id", id.clone()), ("b", Value::Int32(2))]);
        let back = doc(&[("b", Value::Int32(2)), ("_id", id.clone())]);

        let a = serialize(&front, false, true).unwrap();
        let b = serialize(&back, false, true).unwrap();
        assert_eq!(a, b);

        // first field emitted is "_id": tag at offset 4, key starts at 5.
        assert_eq!(&a[5..9], b"_id\0");
    }

    #[test]
    fn move_id_false_preserves_order() {
        let d = doc(&[("b", Value::Int32(2)), ("_id", Value::Int32(7))]);
        let out = serialize(&d, false, false).unwrap();
        assert_eq!(&out[5..7], b"b\0");
    }

    #[test]
    fn duplicate_id_fields_are_reported() {
        let mut d = OrderedDocument::new();
        d.push("_id", 1i32);
        d.push("_id", 2i32);
        let outcome = serialize_with_outcome(&d, false, true).unwrap();
        assert_eq!(outcome.extra_id_fields_skipped, 1);
    }

    #[test]
    fn array_uses_decimal_string_keys() {
        let d = doc(&[(
            "arr",
            Value::Array(vec![Value::Int32(10), Value::String("z".into()), Value::Boolean(true)]),
        )]);
        let out = serialize(&d, false, false).unwrap();
        let decoded = crate::de::deserialize(&out).unwrap();
        assert_eq!(
            decoded.get("arr"),
            Some(&Value::Array(vec![
                Value::Int32(10),
                Value::String("z".into()),
                Value::Boolean(true)
            ]))
        );
    }

    #[test]
    fn binary_legacy_subtype_has_inner_length() {
        let d = doc(&[(
            "bin",
            Value::Binary(Binary {
                subtype: BINARY_SUBTYPE_LEGACY,
                data: vec![1, 2, 3],
            }),
        )]);
        let out = serialize(&d, false, false).unwrap();
        // tag(1) + key("bin\0")(4) + outer_len(4) = offset 9 for subtype byte.
        let outer_len = i32::from_le_bytes([out[9], out[10], out[11], out[12]]);
        assert_eq!(outer_len, 3 + 4);
        assert_eq!(out[13], BINARY_SUBTYPE_LEGACY);
        let inner_len = i32::from_le_bytes([out[14], out[15], out[16], out[17]]);
        assert_eq!(inner_len, 3);
    }

    #[test]
    fn regex_flags_sorted_on_wire() {
        let mut r = Regex::new("a+");
        r.extended = true;
        r.ignore_case = true;
        let d = doc(&[("re", Value::Regex(r))]);
        let out = serialize(&d, false, false).unwrap();
        // tag + "re\0" + "a+\0" => flags start right after.
        let flags_start = 4 + 1 + 3 + 3;
        assert_eq!(&out[flags_start..flags_start + 2], b"ix");
    }

    #[test]
    fn document_too_large_is_rejected() {
        let mut d = OrderedDocument::new();
        d.push("blob", Value::Binary(Binary { subtype: 0, data: vec![0u8; MAX_DOCUMENT_SIZE + 16] }));
        assert!(matches!(
            serialize(&d, false, false),
            Err(Error::InvalidDocument(_))
        ));
    }

    #[test]
    fn timestamp_writes_increment_then_seconds() {
        let d = doc(&[("ts", Value::Timestamp(Timestamp { increment: 1, seconds: 2 }))]);
        let out = serialize(&d, false, false).unwrap();
        let payload_start = 4 + 1 + 3; // len + tag + "ts\0"
        assert_eq!(&out[payload_start..payload_start + 4], &1u32.to_le_bytes());
        assert_eq!(&out[payload_start + 4..payload_start + 8], &2u32.to_le_bytes());
    }
}
