//! IMAP connection configuration

use crate::error::{Error, Result};
use std::env;
use std::fmt;
use std::time::Duration;

/// Network timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// IMAP connection configuration
#[derive(Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Wrap the connection in TLS from the first byte (IMAPS).
    pub use_tls: bool,
    /// Upper bound for connecting and for each command afterwards.
    pub timeout_secs: u64,
    /// Skip certificate verification (self-signed bridges, test servers).
    pub accept_invalid_certs: bool,
}

impl ImapConfig {
    /// Configuration with TLS on, the default timeout and strict
    /// certificate checks.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            use_tls: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: false,
        }
    }

    /// Build a configuration from optional pieces, as handed over by a
    /// command line or environment.
    ///
    /// Empty strings and port `0` count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] naming the first missing setting.
    pub fn from_parts(
        host: Option<String>,
        port: Option<u16>,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let host = required(host, "server")?;
        let port = port
            .filter(|p| *p != 0)
            .ok_or_else(|| missing("port"))?;
        let username = required(username, "username")?;
        let password = required(password, "password")?;
        Ok(Self::new(host, port, username, password))
    }

    /// Load IMAP configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `IMAP_HOST`
    /// - `IMAP_PORT`
    /// - `IMAP_USERNAME`
    /// - `IMAP_PASSWORD`
    ///
    /// The optional overrides of [`apply_env_overrides`] apply on top.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] when a required variable is missing or a
    /// value does not parse.
    ///
    /// [`apply_env_overrides`]: Self::apply_env_overrides
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|name| env::var(name).ok())
    }

    /// Apply the optional environment overrides:
    /// - `IMAP_TLS` (`true`/`false`)
    /// - `IMAP_INSECURE` (`true`/`false`)
    /// - `IMAP_TIMEOUT` in seconds
    ///
    /// Unset variables leave the current value alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] when a value does not parse or the
    /// timeout is zero.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(&|name| env::var(name).ok())
    }

    /// Set the network timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] for `0`, which would fail every step.
    pub fn set_timeout_secs(&mut self, secs: u64) -> Result<()> {
        if secs == 0 {
            return Err(Error::Usage("timeout must be at least 1 second".into()));
        }
        self.timeout_secs = secs;
        Ok(())
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = lookup("IMAP_PORT")
            .map(|p| {
                p.parse::<u16>()
                    .map_err(|e| Error::Usage(format!("Invalid IMAP_PORT: {e}")))
            })
            .transpose()?;

        let mut config = Self::from_parts(
            lookup("IMAP_HOST"),
            port,
            lookup("IMAP_USERNAME"),
            lookup("IMAP_PASSWORD"),
        )?;
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("IMAP_TLS") {
            self.use_tls = parse_flag("IMAP_TLS", &value)?;
        }
        if let Some(value) = lookup("IMAP_INSECURE") {
            self.accept_invalid_certs = parse_flag("IMAP_INSECURE", &value)?;
        }
        if let Some(value) = lookup("IMAP_TIMEOUT") {
            let secs = value
                .parse()
                .map_err(|e| Error::Usage(format!("Invalid IMAP_TIMEOUT: {e}")))?;
            self.set_timeout_secs(secs)?;
        }
        Ok(())
    }

    /// `host:port` as used for the TCP connection.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for ImapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("use_tls", &self.use_tls)
            .field("timeout_secs", &self.timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

fn missing(name: &str) -> Error {
    Error::Usage(format!("missing required setting: {name}"))
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(name))
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Usage(format!("Invalid {name}: {other}"))),
    }
}
