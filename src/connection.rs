//! IMAP transport and session helpers
//!
//! Opens a plaintext or implicit-TLS connection, logs in, and wraps
//! every network step in the configured timeout.

use crate::config::ImapConfig;
use crate::error::{Error, Result};
use async_imap::Session;
use rustls::RootCertStore;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info};

/// Byte stream an IMAP session runs over: plain TCP or TLS over TCP.
pub trait ImapStream: AsyncRead + AsyncWrite + Unpin + Send + Debug {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + Debug> ImapStream for T {}

/// An authenticated IMAP session over either transport.
pub type ImapSession = Session<Compat<Box<dyn ImapStream>>>;

/// Run `fut`, failing with [`Error::Connection`] once `limit` elapses.
pub async fn with_timeout<T>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        Error::Connection(format!("{what} timed out after {}s", limit.as_secs()))
    })?
}

/// Open a fresh, logged-in IMAP session.
///
/// Connects to `config.host:config.port` via TCP, performs the TLS
/// handshake first when `config.use_tls` is set, and logs in.
pub async fn connect(config: &ImapConfig) -> Result<ImapSession> {
    let addr = config.address();
    debug!("Connecting to IMAP server at {} (tls: {})", addr, config.use_tls);

    let tcp_stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| Error::Connection(format!("Cannot reach {addr}: {e}")))?;

    let stream: Box<dyn ImapStream> = if config.use_tls {
        let connector = tls_connector(config.accept_invalid_certs)?;
        let server_name = ServerName::try_from(config.host.clone())
            .map_err(|e| Error::Connection(format!("Invalid server name: {e}")))?;
        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| Error::Connection(format!("TLS handshake failed: {e}")))?;
        Box::new(tls_stream)
    } else {
        Box::new(tcp_stream)
    };

    let client = async_imap::Client::new(stream.compat());
    let session = client
        .login(&config.username, &config.password)
        .await
        .map_err(|(e, _)| Error::Connection(format!("Login failed: {e}")))?;

    info!("Connected to IMAP server at {}", addr);
    Ok(session)
}

/// SELECT a folder on an existing session.
pub async fn select(session: &mut ImapSession, folder: &str) -> Result<()> {
    session
        .select(folder)
        .await
        .map_err(|e| Error::Connection(format!("Failed to select {folder}: {e}")))?;
    Ok(())
}

/// Build a TLS connector backed by the ring provider.
///
/// Server certificates are checked against the Mozilla root set unless
/// `accept_invalid_certs` is set.
fn tls_connector(accept_invalid_certs: bool) -> Result<TlsConnector> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Connection(format!("TLS setup failed: {e}")))?;

    let config = if accept_invalid_certs {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert::new(&provider)))
            .with_no_client_auth()
    } else {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        builder.with_root_certificates(roots).with_no_client_auth()
    };

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Certificate verifier that trusts any server certificate.
///
/// Handshake signatures are still checked, so the peer must hold the
/// key for the certificate it presents.
#[derive(Debug)]
struct AcceptAnyCert {
    algorithms: WebPkiSupportedAlgorithms,
}

impl AcceptAnyCert {
    fn new(provider: &CryptoProvider) -> Self {
        Self {
            algorithms: provider.signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
