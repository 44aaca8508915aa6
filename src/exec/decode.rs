// src/exec/decode.rs

//! Best-effort decoding of captured command output.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Substituted for output that cannot be decoded cleanly.
pub const UNPARSABLE_OUTPUT: &str = "unparsable output";

/// Detect the character encoding of `bytes` and decode them.
///
/// The detector only guesses encodings that decode the whole input, and
/// falls back to windows-1252 which maps every byte, so in practice this
/// never yields [`UNPARSABLE_OUTPUT`]. The sentinel comes from
/// [`decode_as`].
pub fn decode_output(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_as(bytes, detector.guess(None, true))
}

/// Decode `bytes` as `encoding`, or [`UNPARSABLE_OUTPUT`] when they are
/// malformed in it.
pub fn decode_as(bytes: &[u8], encoding: &'static Encoding) -> String {
    match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text.into_owned(),
        None => UNPARSABLE_OUTPUT.to_string(),
    }
}
