//! BSON value taxonomy — the tagged sum type `spec.md` §9 asks for in
//! place of the upstream's runtime class-name dispatch.

use crate::document::OrderedDocument;
use crate::error::{Error, Result};

/// A 12-byte BSON ObjectId.
///
/// Carries no semantic fields of its own here (see [`crate::oid`] for the
/// generator that builds one per spec §4.5); this is just the wire-shape
/// wrapper around the 12 raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub [u8; 12]);

impl ObjectId {
    /// Wraps 12 raw bytes as an ObjectId.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// The raw 12 bytes.
    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 24 || !s.is_ascii() {
            return Err(Error::InvalidDocument(format!(
                "ObjectId hex string must be 24 ASCII hex characters, got {s:?}"
            )));
        }
        // `s.is_ascii()` guarantees every char is one byte, so byte offsets
        // below always land on char boundaries.
        let hex = s.as_bytes();
        let mut bytes = [0u8; 12];
        for (i, chunk) in bytes.iter_mut().enumerate() {
            let pair = std::str::from_utf8(&hex[i * 2..i * 2 + 2]).unwrap();
            *chunk = u8::from_str_radix(pair, 16)
                .map_err(|_| Error::InvalidDocument(format!("invalid ObjectId hex: {s:?}")))?;
        }
        Ok(Self(bytes))
    }
}

/// Binary data: a subtype byte plus raw bytes (spec §3.2, §4.3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub subtype: u8,
    pub data: Vec<u8>,
}

/// Legacy binary subtype that carries an extra inner length prefix
/// (spec §4.3.1's "legacy subtype 2 exception").
pub const BINARY_SUBTYPE_LEGACY: u8 = 0x02;

/// A regular expression: pattern plus flags.
///
/// `ignore_case`/`multiline`/`extended` are the three letters spec §4.3.1
/// names as mapping to host regex engine modes (`i`/`m`/`x`); `extra_flags`
/// holds any other flag letters verbatim so they round-trip even though
/// this crate doesn't interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Regex {
    pub pattern: String,
    pub ignore_case: bool,
    pub multiline: bool,
    pub extended: bool,
    pub extra_flags: String,
}

impl Regex {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    /// Builds the canonical, ascending-byte-order flag string this crate
    /// writes to the wire (spec §3.3, §4.3.1).
    pub fn flags_string(&self) -> String {
        let mut flags: Vec<u8> = Vec::new();
        if self.ignore_case {
            flags.push(b'i');
        }
        if self.multiline {
            flags.push(b'm');
        }
        if self.extended {
            flags.push(b'x');
        }
        flags.extend(self.extra_flags.bytes());
        flags.sort_unstable();
        flags.dedup();
        String::from_utf8(flags).expect("flag letters are ASCII")
    }

    /// Parses a wire flag string into known (`i`/`m`/`x`) and `extra`
    /// letters, per spec §4.4.
    pub fn from_wire(pattern: String, flags: &str) -> Self {
        let mut out = Self::new(pattern);
        let mut extra = String::new();
        for ch in flags.chars() {
            match ch {
                'i' => out.ignore_case = true,
                'm' => out.multiline = true,
                'x' => out.extended = true,
                other => extra.push(other),
            }
        }
        out.extra_flags = extra;
        out
    }
}

/// The MongoDB replication Timestamp type: two 32-bit **unsigned** words
/// (spec §3.2), written increment-then-seconds (spec §4.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub increment: u32,
    pub seconds: u32,
}

/// JavaScript code paired with a variable-binding scope document.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptCodeWithScope {
    pub code: String,
    pub scope: OrderedDocument,
}

/// `{"$ref": collection, "$id": value}`, surfaced as its own variant per
/// the GLOSSARY rather than left as a plain document (spec §4.4, §9).
///
/// Always serializes as a `$ref`/`$id` embedded document (tag `0x03`);
/// decodes from either that shape or the legacy DBPointer tag (`0x0c`).
#[derive(Debug, Clone, PartialEq)]
pub struct DbRef {
    pub collection: String,
    pub id: Box<Value>,
}

/// A BSON value: the tagged sum type spec §9 asks for in place of
/// runtime-class dispatch. Variants map 1:1 onto the spec §3.2/§6.1 table,
/// except `Undefined` (read-only, decodes to `Null` — spec §3.2/§4.4, so
/// there is no slot for it) and `Decimal128` (tag `0x13` is outside the
/// §6.1 tag set this codec supports).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// IEEE-754 double (tag 0x01).
    Double(f64),
    /// UTF-8 string (tag 0x02).
    String(String),
    /// Embedded document (tag 0x03).
    Document(OrderedDocument),
    /// Ordered array (tag 0x04).
    Array(Vec<Value>),
    /// Binary data (tag 0x05).
    Binary(Binary),
    /// ObjectId (tag 0x07).
    ObjectId(ObjectId),
    /// Boolean (tag 0x08).
    Boolean(bool),
    /// UTC datetime, milliseconds since the Unix epoch (tag 0x09).
    DateTime(i64),
    /// Null (tag 0x0a).
    Null,
    /// Regular expression (tag 0x0b).
    Regex(Regex),
    /// `{"$ref": ..., "$id": ...}` (encodes as tag 0x03; also decodes from
    /// legacy DBPointer, tag 0x0c).
    DbRef(DbRef),
    /// JavaScript code without scope (tag 0x0d).
    JavaScript(String),
    /// Symbol (tag 0x0e, deprecated).
    Symbol(String),
    /// JavaScript code with a scope document (tag 0x0f, deprecated).
    CodeWithScope(JavaScriptCodeWithScope),
    /// 32-bit signed integer (tag 0x10).
    Int32(i32),
    /// Replication timestamp (tag 0x11).
    Timestamp(Timestamp),
    /// 64-bit signed integer (tag 0x12).
    Int64(i64),
    /// MinKey sentinel (tag 0xff).
    MinKey,
    /// MaxKey sentinel (tag 0x7f).
    MaxKey,
}

impl Value {
    /// Picks the narrowest BSON integer representation for `n`, per spec
    /// §3.3: `Int32` in `[-2^31, 2^31-1]`, else `Int64` in `i64`'s range,
    /// else a `RangeError`. See `SPEC_FULL.md` §B.2 for why this exists
    /// alongside the directly-typed `Int32`/`Int64` variants.
    pub fn integer(n: i128) -> Result<Value> {
        if let Ok(v) = i32::try_from(n) {
            Ok(Value::Int32(v))
        } else if let Ok(v) = i64::try_from(n) {
            Ok(Value::Int64(v))
        } else {
            Err(Error::RangeError(n))
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<OrderedDocument> for Value {
    fn from(v: OrderedDocument) -> Self {
        Value::Document(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}
