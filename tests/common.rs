#![allow(missing_docs, dead_code)]

//! Helpers shared by the integration tests: starting a server over a fresh
//! temp directory and speaking raw FTP over a TCP socket.

use ftpserve::Server;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Spawns a server rooted at a fresh temp directory and waits until its
/// control port accepts connections. The server runs on its own thread with
/// its own runtime so it outlives the per-test runtimes. Returns the root so
/// tests can place fixture files in it.
pub fn start_server(addr: &'static str, passive_ports: RangeInclusive<u16>) -> PathBuf {
    let root = tempfile::tempdir().unwrap().keep();
    let server_root = root.clone();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let server = Server::with_fs(server_root).passive_ports(passive_ports).build().unwrap();
            server.listen(addr).await.unwrap();
        });
    });
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return root;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    panic!("server at {} did not come up", addr);
}

/// One control connection with line-at-a-time reading.
pub struct Client {
    stream: TcpStream,
    buffer: Vec<u8>,
}

impl Client {
    pub async fn connect(addr: &str) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        Client { stream, buffer: Vec::new() }
    }

    /// Reads exactly one CRLF terminated reply line.
    pub async fn read_from_server(&mut self) -> String {
        loop {
            if let Some(pos) = self.buffer.windows(2).position(|w| w == b"\r\n") {
                let line: Vec<u8> = self.buffer.drain(..pos + 2).collect();
                return String::from_utf8(line).unwrap();
            }
            let mut chunk = [0u8; 1024];
            let n = self.stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "server closed the control connection unexpectedly");
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Reads reply lines until (and including) the closing line of a
    /// multi-line reply with the given code.
    pub async fn read_multiline(&mut self, code: &str) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_from_server().await;
            let done = line.starts_with(&format!("{} ", code));
            lines.push(line);
            if done {
                return lines;
            }
        }
    }

    pub async fn send_to_server(&mut self, line: &str) {
        self.stream.write_all(line.as_bytes()).await.unwrap();
    }

    /// Performs the USER/PASS handshake, asserting the scenario-exact reply
    /// texts along the way.
    pub async fn login(&mut self, username: &str) {
        self.send_to_server(&format!("USER {}\r\n", username)).await;
        assert_eq!(self.read_from_server().await, "331 User name okay, need password.\r\n");
        self.send_to_server("PASS secret\r\n").await;
        assert_eq!(self.read_from_server().await, "230 User logged in, proceed.\r\n");
    }

    /// Hands back the raw socket, e.g. to wrap it in TLS after an AUTH TLS
    /// exchange. Nothing may be left half-read.
    pub fn into_stream(self) -> TcpStream {
        assert!(self.buffer.is_empty(), "unconsumed control-channel bytes");
        self.stream
    }

    /// Issues PASV and dials the announced endpoint.
    pub async fn pasv_connect(&mut self) -> TcpStream {
        self.send_to_server("PASV\r\n").await;
        let reply = self.read_from_server().await;
        let addr = parse_pasv(&reply).unwrap();
        TcpStream::connect(addr).await.unwrap()
    }
}

pub fn parse_pasv(line: &str) -> Result<SocketAddr, &'static str> {
    if !line.starts_with("227 ") {
        return Err("not a 227 reply");
    }
    let body = line.split_once('(').and_then(|(_, rest)| rest.split_once(')')).ok_or("bad format")?.0;
    let nums: Vec<u8> = body.split(',').filter_map(|s| s.trim().parse().ok()).collect();
    if nums.len() != 6 {
        return Err("need 6 numbers");
    }
    let port = u16::from(nums[4]) * 256 + u16::from(nums[5]);
    Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(nums[0], nums[1], nums[2], nums[3])), port))
}

/// Drains a data connection to EOF.
pub async fn read_data_from_server(stream: &mut TcpStream) -> Vec<u8> {
    let mut data = Vec::new();
    stream.read_to_end(&mut data).await.unwrap();
    data
}
