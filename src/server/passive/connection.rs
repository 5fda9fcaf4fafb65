//! A single pending or live passive data connection.

use crate::server::io::DataStream;
use crate::server::tls;
use rustls::ServerConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::oneshot;

/// How long a reserved passive endpoint waits for the client to dial in
/// before it is torn down.
pub const WAIT_TIMEOUT: Duration = Duration::from_millis(9000);

/// Why a reserved passive endpoint never became a usable data connection.
#[derive(Debug, Error)]
pub enum DataConnError {
    #[error("client did not dial in within {:?}", WAIT_TIMEOUT)]
    WaitTimeout,
    #[error("TLS handshake on the data channel failed")]
    Tls(#[source] std::io::Error),
    #[error("the passive listener failed: {0}")]
    Listener(String),
    #[error("the passive data connection was closed")]
    Closed,
}

/// The session's handle to a reserved passive endpoint. It exists from the
/// moment the pool hands it out (listener bound and listening, so the 227
/// reply may be sent) until the client dials in or the wait times out.
#[derive(Debug)]
pub struct PassiveDataConn {
    port: u16,
    ready: oneshot::Receiver<Result<DataStream, DataConnError>>,
}

impl PassiveDataConn {
    pub(super) fn new(port: u16, ready: oneshot::Receiver<Result<DataStream, DataConnError>>) -> Self {
        PassiveDataConn { port, ready }
    }

    /// The passive port the client was told to dial.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the client to dial in (and for the optional TLS handshake on
    /// the accepted socket), yielding the live data stream.
    pub async fn wait_ready(self) -> Result<DataStream, DataConnError> {
        self.ready.await.unwrap_or(Err(DataConnError::Closed))
    }
}

// The listener's half of a reservation. `install` is invoked at most once,
// with the socket the listener accepted from the expected remote IP.
#[derive(Debug)]
pub(super) struct Waiter {
    pub id: u64,
    pub tx: oneshot::Sender<Result<DataStream, DataConnError>>,
    pub tls: Option<Arc<ServerConfig>>,
}

impl Waiter {
    pub(super) async fn install(self, raw: TcpStream) {
        let outcome = match self.tls {
            None => Ok(DataStream::Plain(raw)),
            Some(config) => match tls::accept(config, raw).await {
                Ok((stream, _authorized)) => Ok(DataStream::Tls(Box::new(stream))),
                Err(err) => Err(DataConnError::Tls(err)),
            },
        };
        // The session may have given up in the meantime; then the socket is
        // simply dropped.
        let _ = self.tx.send(outcome);
    }

    pub(super) fn fail(self, err: DataConnError) {
        let _ = self.tx.send(Err(err));
    }
}
