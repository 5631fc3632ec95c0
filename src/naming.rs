//! `.eml` file name derivation
//!
//! Names are built from the decoded sender and subject of a message:
//!
//! ```text
//! {sender}_{subject}.eml          NamingScheme::SenderSubject
//! {uid}_{sender}_{subject}.eml    NamingScheme::IdSenderSubject
//! ```
//!
//! The subject loses every CRLF and `/`, the sender every `"`. On top of
//! that, path separators and control characters are dropped from both
//! so the result is always a single path segment, and the name is cut
//! to fit the usual 255-byte file name limit.

use crate::record::MessageRecord;
use rfc2047_decoder::{Decoder, RecoverStrategy};

const EXTENSION: &str = ".eml";
const MAX_FILE_NAME_BYTES: usize = 255;

/// How a store turns a message into a file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingScheme {
    /// `{sender}_{subject}.eml`. Two messages sharing sender and subject
    /// map to the same file; the later one is skipped.
    #[default]
    SenderSubject,
    /// `{uid}_{sender}_{subject}.eml`. Unique per message within one
    /// mailbox.
    IdSenderSubject,
}

impl NamingScheme {
    /// File name (no directory) for `record`.
    #[must_use]
    pub fn file_name(self, record: &MessageRecord) -> String {
        let sender = clean_sender(record.sender());
        let subject = clean_subject(record.subject());

        let mut stem = match self {
            Self::SenderSubject => format!("{sender}_{subject}"),
            Self::IdSenderSubject => format!("{}_{sender}_{subject}", record.id()),
        };
        truncate_at_char_boundary(&mut stem, MAX_FILE_NAME_BYTES - EXTENSION.len());
        stem.push_str(EXTENSION);
        stem
    }
}

/// Decode RFC 2047 encoded words in a header value.
///
/// Encoded segments are decoded and concatenated with the surrounding
/// text. Words longer than the 75 characters RFC 2047 allows are still
/// decoded. Values that do not decode (unknown charset, malformed word)
/// come back unchanged.
///
/// ```
/// use emailsafe::decode_header_value;
///
/// assert_eq!(decode_header_value("=?UTF-8?Q?Caf=C3=A9?="), "Café");
/// assert_eq!(decode_header_value("plain text"), "plain text");
/// ```
#[must_use]
pub fn decode_header_value(value: &str) -> String {
    Decoder::new()
        .too_long_encoded_word_strategy(RecoverStrategy::Decode)
        .decode(value.as_bytes())
        .unwrap_or_else(|_| value.to_string())
}

fn clean_sender(raw: &str) -> String {
    strip_unsafe(&decode_header_value(raw).replace('"', ""))
}

fn clean_subject(raw: &str) -> String {
    let decoded = decode_header_value(raw);
    strip_unsafe(&decoded.replace("\r\n", "").replace('/', ""))
}

fn strip_unsafe(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '/' | '\\') && !c.is_control())
        .collect()
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
