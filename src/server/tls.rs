//! Builds the rustls server configuration and performs the actual TLS
//! upgrades for both the control and the data channel.

use crate::options::{FtpsClientAuth, TlsFlags};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;

// FtpsConfig shows how TLS security is configured for the server.
#[derive(Debug, Clone)]
pub enum FtpsConfig {
    Off,
    On { tls_config: Arc<ServerConfig> },
}

impl FtpsConfig {
    pub fn is_configured(&self) -> bool {
        matches!(self, FtpsConfig::On { .. })
    }

    pub fn config(&self) -> Option<Arc<ServerConfig>> {
        match self {
            FtpsConfig::Off => None,
            FtpsConfig::On { tls_config } => Some(tls_config.clone()),
        }
    }
}

pub fn new_config<P: AsRef<Path>>(certs_file: P, key_file: P, flags: TlsFlags, client_auth: FtpsClientAuth, trust_store: P) -> io::Result<Arc<ServerConfig>> {
    let certs: Vec<CertificateDer<'static>> = load_certs(certs_file)?;
    let key: PrivateKeyDer<'static> = load_private_key(key_file)?;

    let mut versions: Vec<&'static rustls::SupportedProtocolVersion> = vec![];
    if flags.contains(TlsFlags::V1_2) {
        versions.push(&rustls::version::TLS12)
    }
    if flags.contains(TlsFlags::V1_3) {
        versions.push(&rustls::version::TLS13)
    }

    let builder = ServerConfig::builder_with_protocol_versions(&versions);
    let builder = match client_auth {
        FtpsClientAuth::Off => builder.with_no_client_auth(),
        FtpsClientAuth::Request | FtpsClientAuth::Require => {
            let mut roots = RootCertStore::empty();
            for cert in load_certs(trust_store)? {
                roots.add(cert).map_err(io::Error::other)?;
            }
            let verifier_builder = WebPkiClientVerifier::builder(Arc::new(roots));
            let verifier_builder = if client_auth == FtpsClientAuth::Request {
                verifier_builder.allow_unauthenticated()
            } else {
                verifier_builder
            };
            let verifier = verifier_builder.build().map_err(io::Error::other)?;
            builder.with_client_cert_verifier(verifier)
        }
    };

    let config = builder.with_single_cert(certs, key).map_err(io::Error::other)?;
    Ok(Arc::new(config))
}

/// Performs the server side of a TLS handshake over `io` and reports whether
/// the peer presented a certificate that verified. Bytes already buffered by
/// the caller must be part of `io` itself (see
/// [`PrefixedStream`](crate::server::io::PrefixedStream)) so nothing is lost
/// during the handshake. On failure the stream is simply dropped.
pub async fn accept<IO>(config: Arc<ServerConfig>, io: IO) -> io::Result<(TlsStream<IO>, bool)>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    let acceptor = TlsAcceptor::from(config);
    let stream = acceptor.accept(io).await?;
    let authorized = stream.get_ref().1.peer_certificates().is_some();
    Ok((stream, authorized))
}

fn load_certs<P: AsRef<Path>>(filename: P) -> io::Result<Vec<CertificateDer<'static>>> {
    let certfile: File = File::open(filename)?;
    let mut reader: BufReader<File> = BufReader::new(certfile);
    rustls_pemfile::certs(&mut reader).collect()
}

fn load_private_key<P: AsRef<Path>>(filename: P) -> io::Result<PrivateKeyDer<'static>> {
    let keyfile = File::open(filename)?;
    let mut reader = BufReader::new(keyfile);
    rustls_pemfile::private_key(&mut reader)?.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "no private key found"))
}
