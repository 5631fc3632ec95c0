//! Fetch-and-persist loop

use crate::client::MailClient;
use crate::error::{Error, Result};
use crate::folder::Folder;
use crate::store::{MessageStore, SaveOutcome};
use serde::Serialize;
use tracing::info;

/// Counts from a completed backup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackupReport {
    /// Messages found in the folder when the run started.
    pub listed: usize,
    /// Messages written to new files.
    pub written: usize,
    /// Messages whose file already existed.
    pub skipped: usize,
}

/// Back up every message in `folder` from `client` into `store`.
///
/// Connects, takes one snapshot of the message ids, then fetches and
/// saves them one at a time in that order before logging out. Messages
/// that arrive after the listing are not included.
///
/// # Errors
///
/// The first connection, fetch or storage error ends the run and is
/// returned as is. Files saved before it stay on disk.
pub async fn run_backup<C, S>(client: &mut C, store: &S, folder: &Folder) -> Result<BackupReport>
where
    C: MailClient + ?Sized,
    S: MessageStore + ?Sized,
{
    info!("Connecting to mail server");
    client.connect(folder).await?;
    if !client.is_connected() {
        return Err(Error::Connection("Connection not established".into()));
    }

    let ids = client.list_message_ids().await?;
    let mut report = BackupReport {
        listed: ids.len(),
        ..BackupReport::default()
    };

    for (count, id) in ids.into_iter().enumerate() {
        let record = client.fetch_message(id).await?;
        match store.save_message(&record).await? {
            SaveOutcome::Written(_) => report.written += 1,
            SaveOutcome::Skipped(_) => report.skipped += 1,
        }
        info!("Processing: {}/{} (UID {})", count + 1, report.listed, id);
    }

    client.close().await?;
    info!(
        "Backup finished: {} written, {} skipped",
        report.written, report.skipped
    );
    Ok(report)
}
