//! The session module implements per-connection session state: who is logged
//! in, where their working directory points, how the channels are secured
//! and which data-channel endpoint, if any, is currently set up.

use super::datachan::DataJob;
use super::io::DataStream;
use super::passive::PassiveDataConn;
use crate::auth::UserDetail;
use crate::notification::EventMeta;
use crate::storage::StorageBackend;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

pub type SharedSession<S, U> = Arc<Mutex<Session<S, U>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Fresh connection; no USER seen yet.
    New,
    /// USER accepted, PASS outstanding.
    WaitPass,
    /// Authenticated.
    WaitCmd,
}

// The TYPE the client selected. Per RFC 959 we always transfer the raw
// bytes; the mode only shows up in the text of the 150 reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Ascii,
    Image,
}

impl TransferMode {
    pub fn label(&self) -> &'static str {
        match self {
            TransferMode::Ascii => "ASCII",
            TransferMode::Image => "BINARY",
        }
    }
}

/// The data-channel sub-state. Exactly one of these holds at any time; PASV
/// and PORT exclude each other until a transfer resets this to `None`.
#[derive(Debug)]
pub enum DataChan {
    /// Neither PORT nor PASV seen since the last transfer.
    None,
    /// PORT/EPRT received; we dial the client when a transfer starts.
    Active {
        addr: SocketAddr,
        socket: Option<TcpStream>,
    },
    /// PASV/EPSV replied; the client has not dialed in yet.
    PassivePending(PassiveDataConn),
    /// The passive dial-in completed and the socket is live.
    PassiveReady(DataStream),
}

// This is where we keep the state for a ftp session.
pub struct Session<S, U>
where
    S: StorageBackend<U>,
    U: UserDetail,
{
    pub source: SocketAddr,
    pub storage: Arc<S>,
    pub user: Arc<Option<U>>,
    pub username: Option<String>,
    pub state: SessionState,
    /// Server-relative working directory, always normalised.
    pub cwd: String,
    /// Server-relative root the session is jailed to.
    pub root: String,
    pub mode: TransferMode,
    /// Argument of the most recent RNFR, consumed by RNTO.
    pub rename_from: Option<String>,
    // True if the command channel is in secure mode.
    pub cmd_tls: bool,
    // True if the data channel will be upgraded to TLS after dial-in.
    pub data_tls: bool,
    pub pbsz_received: bool,
    pub data_chan: DataChan,
    /// A transfer prepared by a command handler, executed by the control
    /// loop after it has written the preliminary 150 reply.
    pub data_job: Option<DataJob>,
    trace_id: String,
    event_sequence: Arc<AtomicU64>,
}

impl<S, U> Session<S, U>
where
    S: StorageBackend<U>,
    U: UserDetail,
{
    pub fn new(storage: Arc<S>, source: SocketAddr) -> Self {
        Session {
            source,
            storage,
            user: Arc::new(None),
            username: None,
            state: SessionState::New,
            cwd: "/".to_string(),
            root: "/".to_string(),
            mode: TransferMode::Ascii,
            rename_from: None,
            cmd_tls: false,
            data_tls: false,
            pbsz_received: false,
            data_chan: DataChan::None,
            data_job: None,
            trace_id: uuid::Uuid::new_v4().to_string(),
            event_sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Resolves a client-supplied path against the cwd, yielding the
    /// server-relative form used for PWD/CWD bookkeeping.
    pub fn virtual_path(&self, arg: &str) -> String {
        super::path::with_cwd(&self.cwd, arg)
    }

    /// Resolves a client-supplied path all the way to the backend: against
    /// the cwd first, then anchored below the session root.
    pub fn backend_path(&self, arg: &str) -> String {
        let virt = self.virtual_path(arg);
        if self.root == "/" {
            virt
        } else {
            format!("{}{}", self.root.trim_end_matches('/'), virt)
        }
    }

    /// Takes the data-channel endpoint, resetting the sub-state to `None` so
    /// the next PASV or PORT is accepted again.
    pub fn take_data_chan(&mut self) -> DataChan {
        std::mem::replace(&mut self.data_chan, DataChan::None)
    }

    /// Event metadata for notification listeners; every call advances the
    /// per-session sequence number.
    pub fn event_meta(&self) -> EventMeta {
        EventMeta {
            username: self.username.clone().unwrap_or_default(),
            trace_id: self.trace_id.clone(),
            sequence_number: self.event_sequence.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// A handle that lets the transfer task stamp events with fresh sequence
    /// numbers without holding the session lock.
    pub fn event_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.event_sequence)
    }

    /// Identifies this session in notification events and logs.
    pub fn trace_id(&self) -> String {
        self.trace_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DefaultUser;
    use crate::storage::Filesystem;
    use pretty_assertions::assert_eq;

    fn session() -> Session<Filesystem, DefaultUser> {
        Session::new(Arc::new(Filesystem::new("/tmp")), "127.0.0.1:2121".parse().unwrap())
    }

    #[test]
    fn backend_path_is_anchored_below_the_root() {
        let mut s = session();
        s.root = "/jail".to_string();
        s.cwd = "/sub".to_string();
        assert_eq!(s.backend_path("file.txt"), "/jail/sub/file.txt");
        assert_eq!(s.backend_path("/top.txt"), "/jail/top.txt");
        assert_eq!(s.backend_path("../../escape"), "/jail/escape");
    }

    #[test]
    fn take_data_chan_resets_to_none() {
        let mut s = session();
        s.data_chan = DataChan::Active {
            addr: "127.0.0.1:2000".parse().unwrap(),
            socket: None,
        };
        assert!(matches!(s.take_data_chan(), DataChan::Active { .. }));
        assert!(matches!(s.data_chan, DataChan::None));
    }
}
