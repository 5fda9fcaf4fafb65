use crate::server::controlchan::commands::{AuthParam, ProtParam, TypeParam};
use crate::server::password::Password;

use bytes::Bytes;
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    User {
        /// The bytes making up the actual username.
        username: Bytes,
    },
    Pass {
        /// The bytes making up the actual password.
        password: Password,
    },
    Acct,
    Syst,
    Stat {
        /// The path about which information is requested, if given.
        path: Option<String>,
    },
    Type {
        /// The representation type the client asked for. Transfers are
        /// always raw bytes; only the 150 reply text changes.
        param: TypeParam,
    },
    Noop,
    Allo,
    Pasv,
    Epsv,
    Port {
        /// The `h1,h2,h3,h4,p1,p2` encoded address to dial for active mode.
        addr: String,
    },
    Eprt {
        /// The `|proto|addr|port|` encoded address to dial for active mode.
        addr: String,
    },
    Retr {
        /// The path to the file the client would like to retrieve.
        path: String,
    },
    Stor {
        /// The path to the file the client would like to store.
        path: String,
    },
    Appe {
        /// The path to the file the client would like to append to.
        path: String,
    },
    List {
        /// The path of the file/directory the client wants to list, possibly
        /// prefixed with `-x` style option words.
        path: Option<String>,
    },
    Nlst {
        /// The path of the file/directory the client wants to list.
        path: Option<String>,
    },
    Feat,
    Opts {
        /// The raw option string; only `UTF8 ON` is accepted.
        option: String,
    },
    Pwd,
    Cwd {
        /// The path the client would like to change directory to.
        path: String,
    },
    Cdup,
    Dele {
        /// The (regular) file to delete.
        path: String,
    },
    Rmd {
        /// The directory to delete.
        path: String,
    },
    Mkd {
        /// The path to the directory the client wants to create.
        path: String,
    },
    Quit,
    Rnfr {
        /// The file to be renamed.
        file: String,
    },
    Rnto {
        /// The filename to rename to.
        file: String,
    },
    Auth {
        protocol: AuthParam,
    },
    Pbsz {
        /// The announced protection buffer size; anything but `0` draws a
        /// corrective reply.
        size: String,
    },
    Prot {
        param: ProtParam,
    },
    Size {
        file: String,
    },
    /// Modification Time (MDTM) as specified in RFC 3659.
    Mdtm {
        file: String,
    },
    Other {
        command_name: String,
        arguments: String,
    },
}

impl Command {
    /// The wire verb for this command; used for whitelisting and logging.
    pub fn verb(&self) -> &str {
        match self {
            Command::User { .. } => "USER",
            Command::Pass { .. } => "PASS",
            Command::Acct => "ACCT",
            Command::Syst => "SYST",
            Command::Stat { .. } => "STAT",
            Command::Type { .. } => "TYPE",
            Command::Noop => "NOOP",
            Command::Allo => "ALLO",
            Command::Pasv => "PASV",
            Command::Epsv => "EPSV",
            Command::Port { .. } => "PORT",
            Command::Eprt { .. } => "EPRT",
            Command::Retr { .. } => "RETR",
            Command::Stor { .. } => "STOR",
            Command::Appe { .. } => "APPE",
            Command::List { .. } => "LIST",
            Command::Nlst { .. } => "NLST",
            Command::Feat => "FEAT",
            Command::Opts { .. } => "OPTS",
            Command::Pwd => "PWD",
            Command::Cwd { .. } => "CWD",
            Command::Cdup => "CDUP",
            Command::Dele { .. } => "DELE",
            Command::Rmd { .. } => "RMD",
            Command::Mkd { .. } => "MKD",
            Command::Quit => "QUIT",
            Command::Rnfr { .. } => "RNFR",
            Command::Rnto { .. } => "RNTO",
            Command::Auth { .. } => "AUTH",
            Command::Pbsz { .. } => "PBSZ",
            Command::Prot { .. } => "PROT",
            Command::Size { .. } => "SIZE",
            Command::Mdtm { .. } => "MDTM",
            Command::Other { command_name, .. } => command_name,
        }
    }

    /// Commands that may be issued before a USER/PASS pair has succeeded.
    pub fn is_auth_exempt(&self) -> bool {
        matches!(
            self,
            Command::User { .. }
                | Command::Pass { .. }
                | Command::Quit
                | Command::Feat
                | Command::Auth { .. }
                | Command::Opts { .. }
                | Command::Noop
                | Command::Syst
                | Command::Type { .. }
                | Command::Pbsz { .. }
                | Command::Prot { .. }
        )
    }

    /// Commands that move bytes over the data channel and therefore need a
    /// prior PASV or PORT.
    pub fn requires_data_chan(&self) -> bool {
        matches!(
            self,
            Command::List { .. } | Command::Nlst { .. } | Command::Retr { .. } | Command::Stor { .. } | Command::Appe { .. }
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
