#![deny(clippy::all)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

//! ftpserve is an extensible, async FTP(S) server library.
//!
//! Because of its pluggable authentication and storage backends it can be
//! embedded wherever an RFC 959 endpoint is needed: in front of a local
//! directory tree, a virtual filesystem or anything else that can implement
//! the [`StorageBackend`](storage::StorageBackend) trait. TLS upgrades of
//! the control channel (`AUTH TLS`) and the data channel (`PROT P`) are
//! supported through [rustls](https://docs.rs/rustls).
//!
//! It runs on top of the Tokio asynchronous run-time and tries to make use
//! of async IO as much as possible.
//!
//! # Quick Start
//!
//! Add the ftpserve and tokio crates to your project's dependencies in
//! Cargo.toml:
//!
//! ```toml
//! [dependencies]
//! ftpserve = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Now you're ready to develop your server! Add the following to src/main.rs:
//!
//! ```no_run
//! #[tokio::main]
//! pub async fn main() {
//!     let ftp_home = std::env::temp_dir();
//!     let server = ftpserve::Server::with_fs(ftp_home)
//!         .greeting("Welcome to my FTP server")
//!         .passive_ports(50000..=65534)
//!         .build()
//!         .unwrap();
//!
//!     server.listen("127.0.0.1:2121").await.unwrap();
//! }
//! ```
//!
//! You can now run your server with cargo run and connect to localhost:2121
//! with your favourite FTP client.

pub mod auth;
pub mod notification;
pub(crate) mod server;
pub mod storage;

pub use crate::server::ftpserver::{
    Server, ServerBuilder,
    error::{ServerError, ServerErrorKind},
    options,
};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
