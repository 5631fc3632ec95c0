//! IMAP mailbox backup library
//!
//! Connects to an IMAP server, lists every message in one folder,
//! fetches each in full and writes it unchanged to an `.eml` file.
//!
//! The protocol side sits behind [`MailClient`] ([`ImapClient`] over
//! plaintext or implicit TLS) and the storage side behind
//! [`MessageStore`] ([`EmlStore`] on the local filesystem).
//! [`run_backup`] joins the two.
//!
//! ```no_run
//! use emailsafe::{EmlStore, Folder, ImapClient, ImapConfig, run_backup};
//!
//! # async fn example() -> emailsafe::Result<()> {
//! let config = ImapConfig::new("imap.example.com", 993, "me", "secret");
//! let mut client = ImapClient::new(config);
//! let report = run_backup(&mut client, &EmlStore::default(), &Folder::Inbox).await?;
//! println!("{} new messages", report.written);
//! # Ok(())
//! # }
//! ```

mod backup;
mod client;
mod config;
mod connection;
mod error;
mod folder;
mod naming;
mod record;
mod store;

pub use backup::{BackupReport, run_backup};
pub use client::{ImapClient, MailClient};
pub use config::{DEFAULT_TIMEOUT_SECS, ImapConfig};
pub use error::{Error, Result};
pub use folder::Folder;
pub use naming::{NamingScheme, decode_header_value};
pub use record::{MessageId, MessageRecord};
pub use store::{EmlStore, MessageStore, SaveOutcome};
