//! Fetched message record

use mailparse::MailHeaderMap;

/// Server-assigned message identifier (an IMAP UID).
pub type MessageId = u32;

/// One message as fetched from the server.
///
/// `sender` and `subject` are the header values exactly as they appear
/// in `raw`: still RFC 2047 encoded, folding intact. Decoding happens
/// when a store derives a file name from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    id: MessageId,
    sender: String,
    subject: String,
    raw: Vec<u8>,
}

impl MessageRecord {
    #[must_use]
    pub fn new(
        id: MessageId,
        sender: impl Into<String>,
        subject: impl Into<String>,
        raw: Vec<u8>,
    ) -> Self {
        Self {
            id,
            sender: sender.into(),
            subject: subject.into(),
            raw,
        }
    }

    /// Build a record from the raw RFC 5322 bytes returned by the server.
    ///
    /// Missing `From` or `Subject` headers yield empty strings; a header
    /// block that does not parse at all yields both empty. `raw` is kept
    /// untouched either way.
    #[must_use]
    pub fn parse(id: MessageId, raw: Vec<u8>) -> Self {
        let (sender, subject) = match mailparse::parse_headers(&raw) {
            Ok((headers, _)) => (
                raw_header(&headers, "From"),
                raw_header(&headers, "Subject"),
            ),
            Err(_) => (String::new(), String::new()),
        };
        Self::new(id, sender, subject, raw)
    }

    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The message bytes exactly as served.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

fn raw_header(headers: &[mailparse::MailHeader<'_>], name: &str) -> String {
    headers
        .get_first_header(name)
        .map(|h| String::from_utf8_lossy(h.get_value_raw()).into_owned())
        .unwrap_or_default()
}
