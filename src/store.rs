//! Message persistence

use crate::error::{Error, Result};
use crate::naming::NamingScheme;
use crate::record::MessageRecord;
use async_trait::async_trait;
use std::future::Future;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// What a save did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new file was written.
    Written(PathBuf),
    /// A file with the derived name already existed and was left alone.
    Skipped(PathBuf),
}

impl SaveOutcome {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::Skipped(path) => path,
        }
    }
}

/// A destination for fetched messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist one message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] when the message cannot be written.
    async fn save_message(&self, record: &MessageRecord) -> Result<SaveOutcome>;
}

/// Writes each message verbatim to `{dir}/{name}.eml`.
///
/// Existing files are never overwritten: a message whose derived name
/// is already taken is reported as [`SaveOutcome::Skipped`]. Each
/// message is written to a scratch file first and hard-linked into
/// place, so a failed write leaves nothing at the derived name and
/// concurrent saves of the same name cannot both land.
#[derive(Debug, Clone)]
pub struct EmlStore {
    dir: PathBuf,
    naming: NamingScheme,
}

impl EmlStore {
    /// Backup directory used when none is given, relative to the
    /// working directory.
    pub const DEFAULT_DIR: &'static str = "mail";

    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            naming: NamingScheme::default(),
        }
    }

    #[must_use]
    pub const fn with_naming(mut self, naming: NamingScheme) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path a record would be saved to.
    #[must_use]
    pub fn path_for(&self, record: &MessageRecord) -> PathBuf {
        self.dir.join(self.naming.file_name(record))
    }

    /// A fresh name for an in-progress write inside the backup directory.
    fn scratch_path(&self) -> PathBuf {
        let seq = SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".emailsafe-{}-{seq}.part", std::process::id()))
    }
}

impl Default for EmlStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIR)
    }
}

#[async_trait]
impl MessageStore for EmlStore {
    async fn save_message(&self, record: &MessageRecord) -> Result<SaveOutcome> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::Storage(format!("Cannot create {}: {e}", self.dir.display()))
        })?;

        let path = self.path_for(record);
        let exists = fs::try_exists(&path)
            .await
            .map_err(|e| Error::Storage(format!("Cannot check {}: {e}", path.display())))?;
        if exists {
            debug!("UID {} already backed up at {}", record.id(), path.display());
            return Ok(SaveOutcome::Skipped(path));
        }

        let raw = record.raw();
        let published = write_staged(&self.scratch_path(), &path, |mut file| async move {
            file.write_all(raw).await?;
            file.sync_all().await
        })
        .await
        .map_err(|e| Error::Storage(format!("Cannot write {}: {e}", path.display())))?;

        if published {
            debug!("UID {} written to {}", record.id(), path.display());
            Ok(SaveOutcome::Written(path))
        } else {
            debug!("UID {} already backed up at {}", record.id(), path.display());
            Ok(SaveOutcome::Skipped(path))
        }
    }
}

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// Fill `scratch` with `write`, then hard-link it to `path`.
///
/// `path` only ever appears with its full contents. Linking fails when
/// `path` already exists, so an existing file is never replaced; that
/// case returns `Ok(false)`. The scratch file is removed on every path.
async fn write_staged<F, Fut>(scratch: &Path, path: &Path, write: F) -> io::Result<bool>
where
    F: FnOnce(fs::File) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(scratch)
        .await?;

    if let Err(e) = write(file).await {
        discard(scratch).await;
        return Err(e);
    }

    let linked = fs::hard_link(scratch, path).await;
    discard(scratch).await;
    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

async fn discard(scratch: &Path) {
    match fs::remove_file(scratch).await {
        Err(e) if e.kind() != ErrorKind::NotFound => {
            warn!("Cannot remove {}: {e}", scratch.display());
        }
        _ => {}
    }
}
