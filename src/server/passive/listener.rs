//! One bound TCP listener on one passive port, shared by every session that
//! reserved that port. Accepted sockets are routed to the waiter registered
//! for the peer's IP address; sockets from unknown peers are dropped.

use super::connection::{DataConnError, PassiveDataConn, WAIT_TIMEOUT, Waiter};
use rustls::ServerConfig;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// The outcome of listen_for_client, seen by the pool.
#[derive(Debug)]
pub(super) enum ListenError {
    // Either this listener already has a waiter for the remote IP, or the
    // bind itself hit EADDRINUSE. The pool reacts the same way to both: try
    // the next port.
    AddrInUse,
    Other(io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Initializing,
    Listening,
}

#[derive(Debug)]
struct Inner {
    state: State,
    next_waiter_id: u64,
    waiters: HashMap<IpAddr, Waiter>,
    // Sessions waiting for the in-flight bind to finish. Errors are fanned
    // out as (kind, message) pairs because io::Error does not clone.
    bind_watchers: Vec<oneshot::Sender<Result<(), (io::ErrorKind, String)>>>,
    accept_task: Option<JoinHandle<()>>,
}

#[derive(Debug)]
pub(super) struct PassiveListener {
    bind_ip: IpAddr,
    port: u16,
    logger: slog::Logger,
    inner: Mutex<Inner>,
}

impl PassiveListener {
    pub fn new(bind_ip: IpAddr, port: u16, logger: slog::Logger) -> Self {
        PassiveListener {
            bind_ip,
            port,
            logger,
            inner: Mutex::new(Inner {
                state: State::Closed,
                next_waiter_id: 0,
                waiters: HashMap::new(),
                bind_watchers: Vec::new(),
                accept_task: None,
            }),
        }
    }

    /// Reserves a waiter slot for `remote_ip` on this port. Returns only once
    /// the listener is actually listening, so the caller may announce the
    /// port to the client. At most one waiter can exist per remote IP; a
    /// second request collides and makes the pool move to the next port.
    pub async fn listen_for_client(self: &Arc<Self>, remote_ip: IpAddr, tls: Option<Arc<ServerConfig>>) -> Result<PassiveDataConn, ListenError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let waiter_id;
        let bind_watcher;
        let must_bind;
        {
            let mut inner = self.inner.lock().expect("passive listener lock");
            if inner.waiters.contains_key(&remote_ip) {
                return Err(ListenError::AddrInUse);
            }
            waiter_id = inner.next_waiter_id;
            inner.next_waiter_id += 1;
            inner.waiters.insert(
                remote_ip,
                Waiter {
                    id: waiter_id,
                    tx: ready_tx,
                    tls,
                },
            );
            (bind_watcher, must_bind) = match inner.state {
                State::Listening => (None, false),
                State::Initializing => {
                    let (tx, rx) = oneshot::channel();
                    inner.bind_watchers.push(tx);
                    (Some(rx), false)
                }
                State::Closed => {
                    inner.state = State::Initializing;
                    let (tx, rx) = oneshot::channel();
                    inner.bind_watchers.push(tx);
                    (Some(rx), true)
                }
            };
        }

        // The wait timer runs from reservation to dial-in.
        let timer_self = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(WAIT_TIMEOUT).await;
            timer_self.expire_waiter(remote_ip, waiter_id);
        });

        if must_bind {
            let bind_self = Arc::clone(self);
            tokio::spawn(async move { bind_self.bind().await });
        }

        if let Some(watcher) = bind_watcher {
            match watcher.await {
                Ok(Ok(())) => {}
                Ok(Err((kind, msg))) => {
                    self.remove_waiter(remote_ip, waiter_id);
                    return Err(match kind {
                        io::ErrorKind::AddrInUse => ListenError::AddrInUse,
                        other => ListenError::Other(io::Error::new(other, msg)),
                    });
                }
                Err(_) => {
                    self.remove_waiter(remote_ip, waiter_id);
                    return Err(ListenError::Other(io::Error::other("passive listener went away while binding")));
                }
            }
        }

        Ok(PassiveDataConn::new(self.port, ready_rx))
    }

    async fn bind(self: Arc<Self>) {
        let result = TcpListener::bind((self.bind_ip, self.port)).await;
        let mut inner = self.inner.lock().expect("passive listener lock");
        match result {
            Ok(listener) => {
                slog::debug!(self.logger, "Passive listener bound"; "port" => self.port);
                inner.state = State::Listening;
                for watcher in inner.bind_watchers.drain(..) {
                    let _ = watcher.send(Ok(()));
                }
                let accept_self = Arc::clone(&self);
                inner.accept_task = Some(tokio::spawn(async move { accept_self.accept_loop(listener).await }));
            }
            Err(err) => {
                slog::debug!(self.logger, "Passive listener failed to bind: {}", err; "port" => self.port);
                inner.state = State::Closed;
                let kind = err.kind();
                let msg = err.to_string();
                for watcher in inner.bind_watchers.drain(..) {
                    let _ = watcher.send(Err((kind, msg.clone())));
                }
                // Waiters registered while the bind was in flight all have a
                // watcher, but clear stragglers anyway so the port frees up.
                for (_, waiter) in inner.waiters.drain() {
                    waiter.fail(DataConnError::Listener(msg.clone()));
                }
            }
        }
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((socket, peer)) => {
                    let peer_ip = canonical_ip(peer.ip());
                    let (waiter, drained) = {
                        let mut inner = self.inner.lock().expect("passive listener lock");
                        let waiter = inner.waiters.remove(&peer_ip);
                        let drained = waiter.is_some() && inner.waiters.is_empty();
                        if drained {
                            inner.state = State::Closed;
                            inner.accept_task = None;
                        }
                        (waiter, drained)
                    };
                    match waiter {
                        Some(waiter) => {
                            tokio::spawn(waiter.install(socket));
                            if drained {
                                // Last waiter got its socket: release the port.
                                return;
                            }
                        }
                        None => {
                            slog::debug!(self.logger, "Dropping stray connection from {}", peer; "port" => self.port);
                        }
                    }
                }
                Err(err) => {
                    slog::warn!(self.logger, "Passive listener accept error: {}", err; "port" => self.port);
                    let mut inner = self.inner.lock().expect("passive listener lock");
                    inner.state = State::Closed;
                    inner.accept_task = None;
                    let msg = err.to_string();
                    for (_, waiter) in inner.waiters.drain() {
                        waiter.fail(DataConnError::Listener(msg.clone()));
                    }
                    return;
                }
            }
        }
    }

    // Removes a specific reservation; the id guards against tearing down a
    // newer waiter from the same IP.
    fn remove_waiter(&self, remote_ip: IpAddr, waiter_id: u64) -> Option<Waiter> {
        let (waiter, task) = {
            let mut inner = self.inner.lock().expect("passive listener lock");
            match inner.waiters.get(&remote_ip) {
                Some(w) if w.id == waiter_id => {
                    let waiter = inner.waiters.remove(&remote_ip);
                    if inner.waiters.is_empty() && inner.state == State::Listening {
                        inner.state = State::Closed;
                        (waiter, inner.accept_task.take())
                    } else {
                        (waiter, None)
                    }
                }
                _ => (None, None),
            }
        };
        if let Some(task) = task {
            // Dropping the accept loop drops the bound socket with it.
            task.abort();
        }
        waiter
    }

    fn expire_waiter(&self, remote_ip: IpAddr, waiter_id: u64) {
        if let Some(waiter) = self.remove_waiter(remote_ip, waiter_id) {
            slog::debug!(self.logger, "Passive data connection timed out waiting for a dial-in"; "port" => self.port);
            waiter.fail(DataConnError::WaitTimeout);
        }
    }
}

// Clients behind dual-stack sockets show up as IPv4-mapped IPv6 addresses;
// reduce those to the dotted quad the waiter was registered under.
pub(super) fn canonical_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn canonical_ip_unwraps_mapped_v4() {
        let mapped = IpAddr::V6("::ffff:127.0.0.1".parse::<Ipv6Addr>().unwrap());
        assert_eq!(canonical_ip(mapped), IpAddr::V4(Ipv4Addr::LOCALHOST));
        let plain = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(canonical_ip(plain), plain);
        let v6 = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert_eq!(canonical_ip(v6), v6);
    }
}
