//! BSON document deserializer (spec.md §4.4).

use crate::document::OrderedDocument;
use crate::error::{DecodeError, Error, Result};
use crate::value::{
    Binary, DbRef, JavaScriptCodeWithScope, ObjectId, Regex, Timestamp, Value,
    BINARY_SUBTYPE_LEGACY,
};

/// Decodes one top-level BSON document from `bytes`.
///
/// `bytes` must contain exactly one document: its declared length prefix
/// must match `bytes.len()` (spec.md's Non-goal on multi-document
/// streaming — each call handles exactly one top-level document).
pub fn deserialize(bytes: &[u8]) -> Result<OrderedDocument> {
    if bytes.len() < 5 {
        return Err(DecodeError::UnexpectedEof.into());
    }
    let mut cursor = Cursor { data: bytes, pos: 0 };
    let doc = cursor.read_document()?;
    if cursor.pos != cursor.data.len() {
        return Err(DecodeError::LengthMismatch {
            declared: cursor.pos as i64,
            available: cursor.data.len(),
        }
        .into());
    }
    Ok(doc)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn check(&self, n: usize) -> Result<()> {
        if self.pos.checked_add(n).map(|end| end > self.data.len()).unwrap_or(true) {
            Err(DecodeError::UnexpectedEof.into())
        } else {
            Ok(())
        }
    }

    fn u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    fn i32_le(&mut self) -> Result<i32> {
        self.check(4)?;
        let v = i32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        Ok(v)
    }

    fn u32_le(&mut self) -> Result<u32> {
        self.check(4)?;
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        Ok(v)
    }

    fn i64_le(&mut self) -> Result<i64> {
        self.check(8)?;
        let v = i64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        Ok(v)
    }

    fn f64_le(&mut self) -> Result<f64> {
        self.check(8)?;
        let v = f64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        Ok(v)
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.check(n)?;
        let v = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(v)
    }

    fn utf8(&mut self, n: usize, what: &'static str) -> Result<String> {
        let bytes = self.bytes(n)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::Decode(DecodeError::InvalidUtf8(what)))
    }

    /// Reads a NUL-terminated C-string (used for keys and regex fields).
    fn read_cstring(&mut self, what: &'static str) -> Result<String> {
        let start = self.pos;
        while self.pos < self.data.len() && self.data[self.pos] != 0 {
            self.pos += 1;
        }
        if self.pos >= self.data.len() {
            return Err(DecodeError::MissingNulTerminator(what).into());
        }
        let s = String::from_utf8(self.data[start..self.pos].to_vec())
            .map_err(|_| Error::Decode(DecodeError::InvalidUtf8(what)))?;
        self.pos += 1; // skip the NUL
        Ok(s)
    }

    /// Reads a length-prefixed BSON string: i32 LE length (payload + NUL),
    /// UTF-8 bytes, NUL.
    fn read_string(&mut self, what: &'static str) -> Result<String> {
        let len = self.i32_le()?;
        if len < 1 {
            return Err(DecodeError::LengthOverrun.into());
        }
        let s = self.utf8(len as usize - 1, what)?;
        let terminator = self.u8()?;
        if terminator != 0 {
            return Err(DecodeError::MissingNulTerminator(what).into());
        }
        Ok(s)
    }

    /// Reads one document (or array, which is wire-identical): a 4-byte
    /// length prefix, elements, and a trailing NUL (spec §4.1, §4.4).
    fn read_document(&mut self) -> Result<OrderedDocument> {
        let declared = self.i32_le()?;
        if declared < 5 {
            return Err(DecodeError::LengthOverrun.into());
        }
        let start = self.pos;
        let end = start
            .checked_add(declared as usize - 4)
            .ok_or(DecodeError::LengthOverrun)?;
        if end > self.data.len() {
            return Err(DecodeError::LengthMismatch {
                declared: declared as i64,
                available: self.data.len(),
            }
            .into());
        }
        let terminator_pos = end - 1;

        let mut doc = OrderedDocument::new();
        while self.pos < terminator_pos {
            let tag = self.u8()?;
            if tag == 0 {
                break;
            }
            let key = self.read_cstring("document key")?;
            let value = self.read_element_value(tag)?;
            doc.push(key, value);
        }
        if self.pos != terminator_pos {
            return Err(DecodeError::LengthOverrun.into());
        }
        if self.u8()? != 0 {
            return Err(DecodeError::MissingNulTerminator("document").into());
        }
        Ok(doc)
    }

    /// Reads tag `0x03`'s payload: a plain embedded document, unless its
    /// first key is `$ref` and it also carries `$id`, in which case it
    /// decodes to [`Value::DbRef`] (spec §4.4 — fragile but load-bearing,
    /// preserved literally per spec §9).
    fn read_document_value(&mut self) -> Result<Value> {
        let doc = self.read_document()?;
        if let Some((first_key, Value::String(collection))) = doc.as_pairs().first() {
            if first_key == "$ref" {
                if let Some(id) = doc.get("$id") {
                    return Ok(Value::DbRef(DbRef {
                        collection: collection.clone(),
                        id: Box::new(id.clone()),
                    }));
                }
            }
        }
        Ok(Value::Document(doc))
    }

    fn read_array(&mut self) -> Result<Vec<Value>> {
        // Wire-identical to a document; discard keys, preserve value order
        // exactly as read (spec §4.4 — no re-sort by parsed key).
        Ok(self.read_document()?.into_pairs().into_iter().map(|(_, v)| v).collect())
    }

    fn read_binary(&mut self) -> Result<Value> {
        let declared_len = self.i32_le()?;
        if declared_len < 0 {
            return Err(DecodeError::LengthOverrun.into());
        }
        let subtype = self.u8()?;
        let data = if subtype == BINARY_SUBTYPE_LEGACY {
            let inner_len = self.i32_le()?;
            if inner_len < 0 || inner_len as i64 != declared_len as i64 - 4 {
                return Err(DecodeError::LengthOverrun.into());
            }
            self.bytes(inner_len as usize)?.to_vec()
        } else {
            self.bytes(declared_len as usize)?.to_vec()
        };
        Ok(Value::Binary(Binary { subtype, data }))
    }

    fn read_object_id(&mut self) -> Result<ObjectId> {
        let bytes = self.bytes(12)?;
        let mut raw = [0u8; 12];
        raw.copy_from_slice(bytes);
        Ok(ObjectId::from_bytes(raw))
    }

    fn read_regex(&mut self) -> Result<Value> {
        let pattern = self.read_cstring("regex pattern")?;
        let flags = self.read_cstring("regex flags")?;
        Ok(Value::Regex(Regex::from_wire(pattern, &flags)))
    }

    fn read_db_pointer(&mut self) -> Result<Value> {
        let namespace = self.read_string("DBPointer namespace")?;
        let id = self.read_object_id()?;
        Ok(Value::DbRef(DbRef {
            collection: namespace,
            id: Box::new(Value::ObjectId(id)),
        }))
    }

    fn read_code_with_scope(&mut self) -> Result<Value> {
        let _total_len = self.i32_le()?; // redundant with the scope doc's own length; not re-validated.
        let code = self.read_string("javascript code")?;
        let scope = self.read_document()?;
        Ok(Value::CodeWithScope(JavaScriptCodeWithScope { code, scope }))
    }

    fn read_timestamp(&mut self) -> Result<Value> {
        let increment = self.u32_le()?;
        let seconds = self.u32_le()?;
        Ok(Value::Timestamp(Timestamp { increment, seconds }))
    }

    fn read_element_value(&mut self, tag: u8) -> Result<Value> {
        match tag {
            0x01 => Ok(Value::Double(self.f64_le()?)),
            0x02 => Ok(Value::String(self.read_string("string value")?)),
            0x03 => self.read_document_value(),
            0x04 => Ok(Value::Array(self.read_array()?)),
            0x05 => self.read_binary(),
            0x06 => Ok(Value::Null), // Undefined: deprecated, read-only, decodes to Null.
            0x07 => Ok(Value::ObjectId(self.read_object_id()?)),
            0x08 => Ok(Value::Boolean(self.u8()? != 0)),
            0x09 => Ok(Value::DateTime(self.i64_le()?)),
            0x0a => Ok(Value::Null),
            0x0b => self.read_regex(),
            0x0c => self.read_db_pointer(),
            0x0d => Ok(Value::JavaScript(self.read_string("javascript code")?)),
            0x0e => Ok(Value::Symbol(self.read_string("symbol")?)),
            0x0f => self.read_code_with_scope(),
            0x10 => Ok(Value::Int32(self.i32_le()?)),
            0x11 => self.read_timestamp(),
            0x12 => Ok(Value::Int64(self.i64_le()?)),
            0xff => Ok(Value::MinKey),
            0x7f => Ok(Value::MaxKey),
            other => Err(DecodeError::UnknownTag(other).into()),
        }
    }
}
