#![allow(missing_docs)]

//! The TLS story: upgrading the control channel with AUTH TLS, the
//! PBSZ/PROT two-step, a protected data channel, and the tls-only gate.

pub mod common;

use ftpserve::Server;
use pretty_assertions::assert_eq;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

const ADDR: &str = "127.0.0.1:2905";
const TLS_ONLY_ADDR: &str = "127.0.0.1:2906";
static SERVERS: OnceLock<()> = OnceLock::new();

// The tests only care that a handshake happens, not who signed what.
#[derive(Debug)]
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn write_certificate(dir: &std::path::Path) -> (PathBuf, PathBuf) {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let certs_file = dir.join("cert.pem");
    let key_file = dir.join("key.pem");
    std::fs::write(&certs_file, certified.cert.pem()).unwrap();
    std::fs::write(&key_file, certified.key_pair.serialize_pem()).unwrap();
    (certs_file, key_file)
}

fn setup() {
    SERVERS.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap().keep();
        let (certs_file, key_file) = write_certificate(&dir);
        let root = dir.join("ftp-root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("greeting.txt"), b"over tls").unwrap();

        let plain_root = root.clone();
        let (c1, k1) = (certs_file.clone(), key_file.clone());
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let server = Server::with_fs(plain_root).ftps(c1, k1).passive_ports(51400..=51499).build().unwrap();
                server.listen(ADDR).await.unwrap();
            });
        });
        let (c2, k2) = (certs_file, key_file);
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let server = Server::with_fs(root)
                    .ftps(c2, k2)
                    .tls_only(true)
                    .passive_ports(51500..=51599)
                    .build()
                    .unwrap();
                server.listen(TLS_ONLY_ADDR).await.unwrap();
            });
        });
        for addr in [ADDR, TLS_ONLY_ADDR] {
            for _ in 0..100 {
                if std::net::TcpStream::connect(addr).is_ok() {
                    break;
                }
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
        }
    });
}

fn connector() -> TlsConnector {
    let config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

struct TlsClient {
    stream: TlsStream<TcpStream>,
    buffer: Vec<u8>,
}

impl TlsClient {
    async fn read_from_server(&mut self) -> String {
        loop {
            if let Some(pos) = self.buffer.windows(2).position(|w| w == b"\r\n") {
                let line: Vec<u8> = self.buffer.drain(..pos + 2).collect();
                return String::from_utf8(line).unwrap();
            }
            let mut chunk = [0u8; 1024];
            let n = self.stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "server closed the TLS control connection unexpectedly");
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    async fn send_to_server(&mut self, line: &str) {
        self.stream.write_all(line.as_bytes()).await.unwrap();
    }
}

/// Speaks the plaintext prologue, upgrades, and returns the encrypted
/// control channel.
async fn upgraded_client(addr: &str) -> TlsClient {
    let mut plain = common::Client::connect(addr).await;
    plain.read_from_server().await;
    plain.send_to_server("AUTH TLS\r\n").await;
    assert_eq!(plain.read_from_server().await, "234 Honored\r\n");
    let stream = plain.into_stream();
    let stream = connector().connect("localhost".try_into().unwrap(), stream).await.unwrap();
    TlsClient {
        stream,
        buffer: Vec::new(),
    }
}

#[tokio::test]
async fn auth_tls_then_login() {
    setup();
    let mut client = upgraded_client(ADDR).await;
    client.send_to_server("USER bob\r\n").await;
    assert_eq!(client.read_from_server().await, "331 User name okay, need password.\r\n");
    client.send_to_server("PASS secret\r\n").await;
    assert_eq!(client.read_from_server().await, "230 User logged in, proceed.\r\n");
    client.send_to_server("PWD\r\n").await;
    assert_eq!(client.read_from_server().await, "257 \"/\" is current directory\r\n");
}

#[tokio::test]
async fn pbsz_and_prot_sequencing() {
    setup();
    let mut client = upgraded_client(ADDR).await;
    // PROT before PBSZ is out of order.
    client.send_to_server("PROT P\r\n").await;
    assert_eq!(client.read_from_server().await, "503 PBSZ must be issued first\r\n");
    client.send_to_server("PBSZ 0\r\n").await;
    assert_eq!(client.read_from_server().await, "200 OK\r\n");
    client.send_to_server("PBSZ 1024\r\n").await;
    assert_eq!(client.read_from_server().await, "200 PBSZ=0\r\n");
    client.send_to_server("PROT C\r\n").await;
    assert_eq!(client.read_from_server().await, "536 Protection level not supported\r\n");
    client.send_to_server("PROT P\r\n").await;
    assert_eq!(client.read_from_server().await, "200 PROT OK. Securing data channel\r\n");
}

#[tokio::test]
async fn protected_data_channel_retr() {
    setup();
    let mut client = upgraded_client(ADDR).await;
    client.send_to_server("USER bob\r\n").await;
    client.read_from_server().await;
    client.send_to_server("PASS secret\r\n").await;
    client.read_from_server().await;
    client.send_to_server("PBSZ 0\r\n").await;
    client.read_from_server().await;
    client.send_to_server("PROT P\r\n").await;
    client.read_from_server().await;

    client.send_to_server("PASV\r\n").await;
    let pasv = client.read_from_server().await;
    let addr = common::parse_pasv(&pasv).unwrap();
    let data_tcp = TcpStream::connect(addr).await.unwrap();
    let mut data_tls = connector().connect("localhost".try_into().unwrap(), data_tcp).await.unwrap();

    client.send_to_server("RETR greeting.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Opening ASCII mode data connection\r\n");
    let mut data = Vec::new();
    data_tls.read_to_end(&mut data).await.unwrap();
    assert_eq!(data, b"over tls");
    assert_eq!(client.read_from_server().await, "226 Closing data connection, sent 8 bytes\r\n");
}

#[tokio::test]
async fn feat_advertises_tls() {
    setup();
    let mut client = common::Client::connect(ADDR).await;
    client.read_from_server().await;
    client.send_to_server("FEAT\r\n").await;
    let lines = client.read_multiline("211").await;
    assert!(lines.contains(&" AUTH TLS\r\n".to_string()));
    assert!(lines.contains(&" PBSZ\r\n".to_string()));
    assert!(lines.contains(&" PROT\r\n".to_string()));
}

#[tokio::test]
async fn tls_only_gates_plaintext_commands() {
    setup();
    let mut client = common::Client::connect(TLS_ONLY_ADDR).await;
    client.read_from_server().await;
    // USER gets the friendly explanation, everything else the 522 gate.
    client.send_to_server("USER alice\r\n").await;
    assert_eq!(client.read_from_server().await, "530 This server requires TLS; issue AUTH TLS before logging in\r\n");
    client.send_to_server("PWD\r\n").await;
    assert_eq!(client.read_from_server().await, "522 A TLS connection is required; use AUTH TLS first\r\n");
    // After the upgrade the same dialogue works.
    drop(client);
    let mut client = upgraded_client(TLS_ONLY_ADDR).await;
    client.send_to_server("USER alice\r\n").await;
    assert_eq!(client.read_from_server().await, "331 User name okay, need password.\r\n");
}
