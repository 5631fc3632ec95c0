//! UID FETCH command handler.
//!
//! Message bodies travel as counted literals:
//!
//! ```text
//! * <seq> FETCH (UID <uid> BODY[] {<length>}
//! <exactly length bytes of raw RFC 5322 message>
//! )
//! ```
//!
//! The body is always reported as `BODY[]`, whether the client asked
//! for `BODY[]` or `BODY.PEEK[]`. Unknown UIDs produce no FETCH line,
//! only the tagged OK, as RFC 3501 prescribes for UID commands. With
//! `interleave_fetches` set, a FETCH for some other message goes out
//! first, the way servers push unsolicited updates.

use crate::fake_imap::io::{write_bytes, write_line};
use crate::fake_imap::mailbox::{Mailbox, TestEmail};
use imap_codec::imap_types::sequence::{SeqOrUid, Sequence, SequenceSet};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Single UIDs named in the set; ranges are not used by the client.
fn extract_uids(seq_set: &SequenceSet) -> Vec<u32> {
    seq_set
        .0
        .as_ref()
        .iter()
        .filter_map(|seq| match seq {
            Sequence::Single(SeqOrUid::Value(v)) => Some(v.get()),
            _ => None,
        })
        .collect()
}

async fn write_fetch<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    seq: usize,
    email: &TestEmail,
) -> std::io::Result<()> {
    let header = format!(
        "* {seq} FETCH (UID {} BODY[] {{{}}}\r\n",
        email.uid,
        email.raw.len()
    );
    write_line(stream, &header).await?;
    write_bytes(stream, &email.raw).await?;
    write_line(stream, ")\r\n").await
}

pub async fn handle_uid_fetch<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    sequence_set: &SequenceSet,
    mailbox: &Mailbox,
    selected_folder: Option<&str>,
    stream: &mut BufReader<S>,
) {
    let Some(folder) = selected_folder.and_then(|name| mailbox.get_folder(name)) else {
        let resp = format!("{tag} BAD No folder selected\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    for uid in extract_uids(sequence_set) {
        if mailbox.interleave_fetches {
            let other = folder.emails.iter().enumerate().find(|(_, e)| e.uid != uid);
            if let Some((idx, email)) = other
                && write_fetch(stream, idx + 1, email).await.is_err()
            {
                return;
            }
        }

        let Some((idx, email)) = folder.emails.iter().enumerate().find(|(_, e)| e.uid == uid)
        else {
            continue;
        };
        if write_fetch(stream, idx + 1, email).await.is_err() {
            return;
        }
    }

    let resp = format!("{tag} OK FETCH completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use std::num::NonZeroU32;
    use tokio::io::BufReader;

    fn uid_set(uid: u32) -> SequenceSet {
        SequenceSet(
            vec![Sequence::Single(SeqOrUid::Value(
                NonZeroU32::new(uid).unwrap(),
            ))]
            .try_into()
            .unwrap(),
        )
    }

    async fn run(sequence_set: &SequenceSet, mailbox: &Mailbox, selected: Option<&str>) -> Vec<u8> {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_uid_fetch("A1", sequence_set, mailbox, selected, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn serves_body_as_counted_literal() {
        let raw = b"From: a@b.com\r\nSubject: Test\r\n\r\nBody".to_vec();
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .email(7, b"From: x@y.com\r\n\r\nother")
            .email(42, &raw)
            .build();

        let output = run(&uid_set(42), &mailbox, Some("INBOX")).await;
        let text = String::from_utf8(output).unwrap();

        let header = format!("* 2 FETCH (UID 42 BODY[] {{{}}}\r\n", raw.len());
        assert!(text.starts_with(&header));
        assert!(text.contains("Subject: Test\r\n\r\nBody)\r\n"));
        assert!(text.ends_with("A1 OK FETCH completed\r\n"));
    }

    #[tokio::test]
    async fn non_utf8_body_is_sent_unchanged() {
        let raw = b"From: a@b.com\r\nSubject: bytes\r\n\r\n\xff\xfe\x00".to_vec();
        let mailbox = MailboxBuilder::new().folder("INBOX").email(1, &raw).build();

        let output = run(&uid_set(1), &mailbox, Some("INBOX")).await;

        assert!(output.windows(raw.len()).any(|w| w == raw.as_slice()));
    }

    #[tokio::test]
    async fn interleaved_fetch_comes_first() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .email(1, b"From: one@example.com\r\n\r\nfirst")
            .email(2, b"From: two@example.com\r\n\r\nsecond")
            .interleave_fetches()
            .build();

        let output = run(&uid_set(2), &mailbox, Some("INBOX")).await;
        let text = String::from_utf8(output).unwrap();

        let other = text.find("* 1 FETCH (UID 1 ").unwrap();
        let wanted = text.find("* 2 FETCH (UID 2 ").unwrap();
        assert!(other < wanted);
        assert!(text.ends_with("A1 OK FETCH completed\r\n"));
    }

    #[tokio::test]
    async fn missing_uid_returns_only_ok() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let output = run(&uid_set(99), &mailbox, Some("INBOX")).await;

        assert_eq!(output, b"A1 OK FETCH completed\r\n");
    }

    #[tokio::test]
    async fn no_folder_selected_returns_bad() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let output = run(&uid_set(1), &mailbox, None).await;

        assert_eq!(output, b"A1 BAD No folder selected\r\n");
    }
}
