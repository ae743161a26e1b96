//! Classifies a byte range as valid UTF-8 (with or without embedded NUL)
//! or not UTF-8 at all.

/// Outcome of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Class {
    /// Valid UTF-8, and NUL-free if `allow_null` was false.
    Ok,
    /// Valid UTF-8 but contains a NUL byte, though `allow_null` was false.
    HasNull,
    /// Not a valid UTF-8 sequence.
    NotUtf8,
}

/// Classifies `bytes` per spec: `HasNull` iff `!allow_null` and a `0x00`
/// byte appears; `NotUtf8` iff the bytes aren't valid UTF-8; else `Ok`.
///
/// Values built from Rust's native `String`/`&str` are already guaranteed
/// valid UTF-8, so `NotUtf8` is unreachable on those paths — it only fires
/// when classifying raw wire bytes read off the network during decode.
pub fn classify(bytes: &[u8], allow_null: bool) -> Utf8Class {
    match std::str::from_utf8(bytes) {
        Err(_) => Utf8Class::NotUtf8,
        Ok(s) => {
            if !allow_null && s.as_bytes().contains(&0) {
                Utf8Class::HasNull
            } else {
                Utf8Class::Ok
            }
        }
    }
}
