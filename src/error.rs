//! Error types for emailsafe

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A session-bound operation was called without an open session.
    #[error("Not connected to the IMAP server")]
    NotConnected,

    /// Transport, TLS, authentication or protocol failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backup directory or a message file could not be written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Required configuration is missing or malformed.
    #[error("Usage error: {0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
