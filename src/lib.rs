//! A BSON document codec: serializer, deserializer, and ObjectId generator.
//!
//! See `buffer`, `utf8`, `document`, and `value` for the pieces the
//! serializer (`ser`) and deserializer (`de`) are built from, and `oid` for
//! standalone ObjectId generation.

mod buffer;
pub mod de;
pub mod document;
pub mod error;
pub mod oid;
pub mod ser;
pub mod utf8;
pub mod value;

pub use de::deserialize;
pub use document::OrderedDocument;
pub use error::{DecodeError, Error, Result};
pub use oid::ObjectIdGenerator;
pub use ser::{serialize, serialize_with_outcome, SerializeOutcome, MAX_DOCUMENT_SIZE};
pub use value::{
    Binary, DbRef, JavaScriptCodeWithScope, ObjectId, Regex, Timestamp, Value,
    BINARY_SUBTYPE_LEGACY,
};
