//! Contains code pertaining to the FTP *data* channel: once a command
//! handler has prepared a transfer, the job defined here moves the bytes
//! between the data socket and the storage backend and produces the final
//! reply for the control channel.

use super::io::DataStream;
use super::session::DataChan;
use super::{Reply, ReplyCode};
use crate::auth::UserDetail;
use crate::notification::{DataEvent, DataListener, EventMeta};
use crate::storage::StorageBackend;
use rustls::ServerConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

/// Per-server transfer behaviour, snapshotted from the builder.
#[derive(Debug, Clone)]
pub struct TransferOpts {
    pub use_read_file: bool,
    pub use_write_file: bool,
    pub upload_max_slurp_size: usize,
    pub destroy_sockets: bool,
}

/// A fully prepared transfer: the data socket is live and the storage side
/// has been opened (or, for slurp uploads, will be opened at completion).
/// The control loop spawns it right after flushing the 150 reply.
pub enum DataJob {
    /// Stream a file to the client.
    Retr {
        socket: DataStream,
        source: Box<dyn tokio::io::AsyncRead + Send + Sync + Unpin>,
        path: String,
    },
    /// Send an already-read file to the client in one go.
    RetrBuffered { socket: DataStream, contents: Vec<u8>, path: String },
    /// Stream the client's upload into the storage backend.
    Stor {
        socket: DataStream,
        sink: Box<dyn tokio::io::AsyncWrite + Send + Sync + Unpin>,
        path: String,
    },
    /// Buffer the upload in memory first, falling back to streaming when it
    /// outgrows the slurp limit.
    StorSlurp {
        socket: DataStream,
        /// Where the storage backend writes.
        backend_path: String,
        /// What listeners and logs see.
        path: String,
        append: bool,
        max: usize,
    },
    /// Send pre-rendered listing lines and close.
    SendLines { socket: DataStream, data: Vec<u8>, path: String },
}

// Everything execute() needs besides the job itself.
pub struct DataCommandExecutor<S, U>
where
    S: StorageBackend<U>,
    U: UserDetail,
{
    pub storage: Arc<S>,
    pub user: Arc<Option<U>>,
    pub listener: Arc<dyn DataListener>,
    pub username: String,
    pub trace_id: String,
    pub sequence: Arc<AtomicU64>,
    pub opts: TransferOpts,
    pub logger: slog::Logger,
}

impl<S, U> DataCommandExecutor<S, U>
where
    S: StorageBackend<U> + 'static,
    U: UserDetail + 'static,
{
    /// Drives the job to completion and returns the reply the control loop
    /// should send after the data socket has been closed. An abort signal
    /// (control connection went away) tears the data socket down; the reply
    /// is then never sent.
    pub async fn execute(self, job: DataJob, abort: oneshot::Receiver<()>) -> Reply {
        tokio::select! {
            reply = self.run(job) => reply,
            _ = abort => {
                slog::info!(self.logger, "Transfer aborted: control channel went away");
                Reply::new(ReplyCode::ConnectionClosed, "Transfer aborted")
            }
        }
    }

    async fn run(&self, job: DataJob) -> Reply {
        match job {
            DataJob::Retr { socket, source, path } => self.retr(socket, source, path).await,
            DataJob::RetrBuffered { socket, contents, path } => self.retr_buffered(socket, contents, path).await,
            DataJob::Stor { socket, sink, path } => self.stor(socket, sink, path).await,
            DataJob::StorSlurp {
                socket,
                backend_path,
                path,
                append,
                max,
            } => self.stor_slurp(socket, backend_path, path, append, max).await,
            DataJob::SendLines { socket, data, path } => self.send_lines(socket, data, path).await,
        }
    }

    async fn retr(&self, mut socket: DataStream, mut source: Box<dyn tokio::io::AsyncRead + Send + Sync + Unpin>, path: String) -> Reply {
        self.emit(DataEvent::RetrStarted { path: path.clone() }).await;
        let started = Instant::now();
        match tokio::io::copy(&mut source, &mut socket).await {
            Ok(bytes) => {
                if let Err(err) = socket.shutdown().await {
                    slog::warn!(self.logger, "RETR: failed to close data socket: {}", err);
                    self.emit(DataEvent::RetrFailed {
                        path,
                        error: err.to_string(),
                    })
                    .await;
                    return Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted");
                }
                self.emit(DataEvent::Got {
                    path,
                    bytes,
                    duration: started.elapsed(),
                })
                .await;
                Reply::new_with_string(ReplyCode::ClosingDataConnection, format!("Closing data connection, sent {} bytes", bytes))
            }
            Err(err) => {
                slog::warn!(self.logger, "RETR: transfer failed: {}", err);
                self.emit(DataEvent::RetrFailed {
                    path,
                    error: err.to_string(),
                })
                .await;
                Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted")
            }
        }
    }

    async fn retr_buffered(&self, mut socket: DataStream, contents: Vec<u8>, path: String) -> Reply {
        self.emit(DataEvent::RetrStarted { path: path.clone() }).await;
        let started = Instant::now();
        let bytes = contents.len() as u64;
        let result = async {
            socket.write_all(&contents).await?;
            socket.shutdown().await
        }
        .await;
        match result {
            Ok(()) => {
                self.emit(DataEvent::Got {
                    path,
                    bytes,
                    duration: started.elapsed(),
                })
                .await;
                Reply::new_with_string(ReplyCode::ClosingDataConnection, format!("Closing data connection, sent {} bytes", bytes))
            }
            Err(err) => {
                slog::warn!(self.logger, "RETR: transfer failed: {}", err);
                self.emit(DataEvent::RetrFailed {
                    path,
                    error: err.to_string(),
                })
                .await;
                Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted")
            }
        }
    }

    async fn stor(&self, mut socket: DataStream, mut sink: Box<dyn tokio::io::AsyncWrite + Send + Sync + Unpin>, path: String) -> Reply {
        self.emit(DataEvent::StorStarted { path: path.clone() }).await;
        let started = Instant::now();
        // copy() awaits the slow side, so a full backend stream pauses reads
        // from the data socket until it drains.
        let result = async {
            let bytes = tokio::io::copy(&mut socket, &mut sink).await?;
            sink.shutdown().await?;
            let _ = socket.shutdown().await;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;
        self.stor_outcome(result, path, started).await
    }

    async fn stor_slurp(&self, mut socket: DataStream, backend_path: String, path: String, append: bool, max: usize) -> Reply {
        self.emit(DataEvent::StorStarted { path: path.clone() }).await;
        let started = Instant::now();
        let user = match self.user.as_ref() {
            Some(u) => u,
            None => return Reply::new(ReplyCode::NotLoggedIn, "Not logged in"),
        };

        // Vec's amortised growth doubles the buffer as the upload arrives.
        let mut buffer: Vec<u8> = Vec::with_capacity(8 * 1024);
        let mut chunk = [0u8; 8 * 1024];
        let result = loop {
            match socket.read(&mut chunk).await {
                Ok(0) => {
                    // Whole upload fit in memory: one write_file call.
                    let len = buffer.len() as u64;
                    break match self.storage.write_file(user, &backend_path, &buffer, append).await {
                        Ok(_) => {
                            let _ = socket.shutdown().await;
                            Ok(len)
                        }
                        Err(err) => Err(std::io::Error::other(err)),
                    };
                }
                Ok(n) => {
                    buffer.extend_from_slice(&chunk[..n]);
                    if max > 0 && buffer.len() > max {
                        // Too big to slurp: stream instead, starting with
                        // what we already buffered.
                        break match self.storage.put(user, &backend_path, append).await {
                            Ok(mut sink) => {
                                let streamed = async {
                                    sink.write_all(&buffer).await?;
                                    let rest = tokio::io::copy(&mut socket, &mut sink).await?;
                                    sink.shutdown().await?;
                                    let _ = socket.shutdown().await;
                                    Ok::<u64, std::io::Error>(buffer.len() as u64 + rest)
                                }
                                .await;
                                streamed
                            }
                            Err(err) => Err(std::io::Error::other(err)),
                        };
                    }
                }
                Err(err) => break Err(err),
            }
        };
        self.stor_outcome(result, path, started).await
    }

    async fn stor_outcome(&self, result: std::io::Result<u64>, path: String, started: Instant) -> Reply {
        match result {
            Ok(bytes) => {
                self.emit(DataEvent::Put {
                    path,
                    bytes,
                    duration: started.elapsed(),
                })
                .await;
                Reply::new(ReplyCode::ClosingDataConnection, "Closing data connection")
            }
            Err(err) => {
                slog::warn!(self.logger, "STOR: transfer failed: {}", err);
                self.emit(DataEvent::StorFailed {
                    path,
                    error: err.to_string(),
                })
                .await;
                Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted")
            }
        }
    }

    async fn send_lines(&self, mut socket: DataStream, data: Vec<u8>, path: String) -> Reply {
        let result = async {
            socket.write_all(&data).await?;
            socket.shutdown().await
        }
        .await;
        match result {
            Ok(()) => {
                self.emit(DataEvent::Listed { path }).await;
                Reply::new(ReplyCode::ClosingDataConnection, "Transfer OK")
            }
            Err(err) => {
                slog::warn!(self.logger, "LIST: transfer failed: {}", err);
                Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted")
            }
        }
    }

    async fn emit(&self, event: DataEvent) {
        let meta = EventMeta {
            username: self.username.clone(),
            trace_id: self.trace_id.clone(),
            sequence_number: self.sequence.fetch_add(1, Ordering::Relaxed),
        };
        self.listener.receive_data_event(event, meta).await;
    }
}

/// Turns the session's data-channel sub-state into a live socket: ACTIVE
/// endpoints are dialed (and TLS-upgraded when `PROT P` is in effect),
/// pending passive endpoints are awaited, ready ones used as-is.
pub async fn acquire(chan: DataChan, tls: Option<Arc<ServerConfig>>, logger: &slog::Logger) -> Result<DataStream, Reply> {
    match chan {
        DataChan::None => Err(Reply::new(ReplyCode::CantOpenDataConnection, "Use PORT or PASV first")),
        DataChan::Active { addr, socket } => {
            let raw = match socket {
                Some(sock) => sock,
                None => TcpStream::connect(addr).await.map_err(|err| {
                    slog::warn!(logger, "Active connect to {} failed: {}", addr, err);
                    Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection")
                })?,
            };
            match tls {
                None => Ok(DataStream::Plain(raw)),
                Some(config) => match super::tls::accept(config, raw).await {
                    Ok((stream, _)) => Ok(DataStream::Tls(Box::new(stream))),
                    Err(err) => {
                        slog::warn!(logger, "TLS handshake on active data connection failed: {}", err);
                        Err(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection"))
                    }
                },
            }
        }
        DataChan::PassivePending(conn) => conn.wait_ready().await.map_err(|err| {
            slog::warn!(logger, "Passive data connection failed: {}", err);
            Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection")
        }),
        DataChan::PassiveReady(stream) => Ok(stream),
    }
}
