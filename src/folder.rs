//! IMAP folder selection
//!
//! A backup run reads exactly one folder. INBOX is the default; any
//! other mailbox is addressed by name.

use std::fmt;

/// The IMAP mailbox a backup reads from.
///
/// # Examples
///
/// ```
/// use emailsafe::Folder;
///
/// assert_eq!(Folder::default().as_str(), "INBOX");
/// assert_eq!(Folder::from("Archive/2023").as_str(), "Archive/2023");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Folder {
    /// The INBOX folder (RFC 3501 required, case-insensitive).
    #[default]
    Inbox,
    /// Any other mailbox, by its server-side name.
    Named(String),
}

impl Folder {
    /// The IMAP folder name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inbox => "INBOX",
            Self::Named(name) => name,
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Folder {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("inbox") {
            Self::Inbox
        } else {
            Self::Named(s.to_string())
        }
    }
}

impl From<String> for Folder {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
