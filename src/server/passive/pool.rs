//! Hands out passive ports from a bounded range to every session on the
//! server.

use super::connection::PassiveDataConn;
use super::listener::{ListenError, PassiveListener};
use dashmap::DashMap;
use rustls::ServerConfig;
use std::io;
use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::sync::Arc;
use thiserror::Error;

/// Returned when the pool cannot produce a passive endpoint; the session
/// reports this to the client as a 421.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no free passive port in the configured range")]
    RangeExhausted,
    #[error("passive listener error")]
    Listener(#[source] io::Error),
}

/// The one piece of state shared by all control connections: a table of
/// passive listeners, one per port actually in use. Ports without waiters
/// hold their listener in the CLOSED state, so the table never shrinks but
/// also never exceeds the configured range.
#[derive(Debug)]
pub struct PassivePool {
    bind_ip: IpAddr,
    range: RangeInclusive<u16>,
    listeners: DashMap<u16, Arc<PassiveListener>>,
    logger: slog::Logger,
}

impl PassivePool {
    pub fn new(bind_ip: IpAddr, range: RangeInclusive<u16>, logger: slog::Logger) -> Self {
        PassivePool {
            bind_ip,
            range,
            listeners: DashMap::new(),
            logger,
        }
    }

    /// Reserves a passive endpoint for a client at `remote_ip`, starting at
    /// the bottom of the range and walking up over ports that are taken
    /// (by this client, or by another process on the machine). Two sessions
    /// from different IPs happily share one port; the listener tells them
    /// apart by peer address.
    pub async fn create_data_connection(&self, remote_ip: IpAddr, tls: Option<Arc<ServerConfig>>) -> Result<PassiveDataConn, PoolError> {
        let mut port = *self.range.start();
        loop {
            let listener = self
                .listeners
                .entry(port)
                .or_insert_with(|| Arc::new(PassiveListener::new(self.bind_ip, port, self.logger.clone())))
                .value()
                .clone();
            match listener.listen_for_client(remote_ip, tls.clone()).await {
                Ok(conn) => return Ok(conn),
                Err(ListenError::AddrInUse) if port < *self.range.end() => {
                    port += 1;
                }
                Err(ListenError::AddrInUse) => {
                    slog::warn!(self.logger, "Passive port range exhausted"; "client" => %remote_ip);
                    return Err(PoolError::RangeExhausted);
                }
                Err(ListenError::Other(err)) => {
                    slog::warn!(self.logger, "Passive listener failed: {}", err; "port" => port);
                    return Err(PoolError::Listener(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::passive::DataConnError;
    use slog::o;
    use std::net::Ipv4Addr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn pool(range: RangeInclusive<u16>) -> PassivePool {
        let logger = slog::Logger::root(slog::Discard {}, o!());
        PassivePool::new(IpAddr::V4(Ipv4Addr::LOCALHOST), range, logger)
    }

    #[tokio::test]
    async fn same_client_gets_distinct_ports() {
        let pool = pool(40100..=40110);
        let client = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let first = pool.create_data_connection(client, None).await.unwrap();
        let second = pool.create_data_connection(client, None).await.unwrap();
        assert_ne!(first.port(), second.port());
        assert!(first.port() >= 40100 && second.port() <= 40110);
    }

    #[tokio::test]
    async fn different_clients_share_the_lowest_port() {
        let pool = pool(40120..=40130);
        let a = pool.create_data_connection(IpAddr::V4(Ipv4Addr::LOCALHOST), None).await.unwrap();
        let b = pool
            .create_data_connection(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)), None)
            .await
            .unwrap();
        assert_eq!(a.port(), b.port());
    }

    #[tokio::test]
    async fn exhausting_the_range_fails() {
        let pool = pool(40140..=40141);
        let client = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let _a = pool.create_data_connection(client, None).await.unwrap();
        let _b = pool.create_data_connection(client, None).await.unwrap();
        let err = pool.create_data_connection(client, None).await.unwrap_err();
        assert!(matches!(err, PoolError::RangeExhausted));
    }

    #[tokio::test]
    async fn dial_in_yields_a_live_stream() {
        let pool = pool(40150..=40160);
        let conn = pool.create_data_connection(IpAddr::V4(Ipv4Addr::LOCALHOST), None).await.unwrap();
        let port = conn.port();
        let dial = tokio::spawn(async move {
            let mut sock = tokio::net::TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap();
            sock.write_all(b"ping").await.unwrap();
            sock.shutdown().await.unwrap();
        });
        let mut stream = conn.wait_ready().await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"ping");
        dial.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unclaimed_reservation_times_out() {
        let pool = pool(40170..=40180);
        let conn = pool.create_data_connection(IpAddr::V4(Ipv4Addr::LOCALHOST), None).await.unwrap();
        let err = conn.wait_ready().await.unwrap_err();
        assert!(matches!(err, DataConnError::WaitTimeout));
    }
}
