//! Contains the [`Server`](crate::Server) struct that is used to configure
//! and control an FTP server instance, along with everything it drives per
//! connection.

pub(crate) mod chancomms;
pub(crate) mod controlchan;
pub(crate) mod datachan;
pub(crate) mod ftpserver;
pub(crate) mod io;
pub(crate) mod listing;
mod password;
pub(crate) mod passive;
pub(crate) mod path;
mod session;
pub(crate) mod tls;

pub(crate) use chancomms::ControlChanMsg;
pub(crate) use controlchan::Event;
pub(crate) use controlchan::command::Command;
pub(crate) use controlchan::reply::{Reply, ReplyCode};
pub(crate) use controlchan::{ControlChanError, ControlChanErrorKind};
pub(crate) use session::{DataChan, Session, SessionState, SharedSession, TransferMode};
