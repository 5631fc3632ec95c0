//! LOGOUT command handler.
//!
//! BYE goes out untagged before the tagged OK, after which the server
//! closes the connection.

use crate::fake_imap::io::write_line;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

pub async fn handle_logout<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    stream: &mut BufReader<S>,
) {
    let _ = write_line(stream, "* BYE Logging out\r\n").await;
    let resp = format!("{tag} OK LOGOUT completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn bye_comes_before_tagged_ok() {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        handle_logout("X1", &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        let output = String::from_utf8(buf).unwrap();

        let bye_pos = output.find("* BYE").unwrap();
        let ok_pos = output.find("X1 OK LOGOUT completed").unwrap();
        assert!(bye_pos < ok_pos);
    }
}
