/// A reply to the FTP client
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    None,
    CodeAndMsg { code: ReplyCode, msg: String },
    MultiLine { code: ReplyCode, lines: Vec<String> },
}

/// The reply codes according to RFC 959.
//
// The three digits form a code. Codes between 100 and 199 indicate marks;
// codes between 200 and 399 indicate acceptance; codes between 400 and 599
// indicate rejection.
//
// Typically the second digit is:
// - 0 for a syntax error
// - 1 for a human-oriented help message,
// - 2 for a hello/goodbye message
// - 3 for an accounting message
// - 5 for a filesystem-related message.
//
// Clients should avoid looking past the first digit of the code, either 1,
// 2, 3, 4, or 5. The other two digits, and all other portions of the
// response, are primarily for human consumption. (Exceptions: greetings,
// responses with code 227, and responses with code 257 have a special
// format.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
#[allow(dead_code)]
pub enum ReplyCode {
    FileStatusOkay = 150,

    CommandOkay = 200,
    CommandOkayNotImplemented = 202,
    SystemStatus = 211,
    DirectoryStatus = 212,
    FileStatus = 213,
    SystemType = 215,
    ServiceReady = 220,
    ClosingControlConnection = 221,
    DataConnectionOpen = 225,
    ClosingDataConnection = 226,
    EnteringPassiveMode = 227,
    EnteringExtendedPassiveMode = 229,
    UserLoggedIn = 230,
    AuthOkayNoDataNeeded = 234,
    FileActionOkay = 250,
    DirCreated = 257,

    NeedPassword = 331,
    FileActionPending = 350,

    ServiceNotAvailable = 421,
    CantOpenDataConnection = 425,
    ConnectionClosed = 426,
    TransientFileError = 450,
    LocalError = 451,
    OutOfSpace = 452,

    CommandSyntaxError = 500,
    ParameterSyntaxError = 501,
    CommandNotImplemented = 502,
    BadCommandSequence = 503,
    CommandNotImplementedForParameter = 504,
    ProtocolNotSupported = 522,
    NotLoggedIn = 530,
    ProtLevelNotSupported = 536,
    FileError = 550,
    ExceededStorageAllocation = 552,
    BadFileName = 553,
}

impl Reply {
    pub fn new(code: ReplyCode, message: &str) -> Self {
        Reply::CodeAndMsg {
            code,
            msg: message.to_string(),
        }
    }

    pub fn new_with_string(code: ReplyCode, msg: String) -> Self {
        Reply::CodeAndMsg { code, msg }
    }

    pub fn new_multiline<I>(code: ReplyCode, lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: std::fmt::Display,
    {
        Reply::MultiLine {
            code,
            lines: lines.into_iter().map(|item| format!("{}", item)).collect(),
        }
    }

    // A no-reply
    pub fn none() -> Self {
        Reply::None
    }

    pub fn code(&self) -> Option<ReplyCode> {
        match self {
            Reply::None => None,
            Reply::CodeAndMsg { code, .. } | Reply::MultiLine { code, .. } => Some(*code),
        }
    }
}

/// Maps a storage error to the reply the client sees, per the RFC 959 error
/// classes.
impl From<&crate::storage::Error> for Reply {
    fn from(err: &crate::storage::Error) -> Reply {
        use crate::storage::ErrorKind;
        match err.kind() {
            ErrorKind::PermanentFileNotAvailable => Reply::new(ReplyCode::FileError, "File not found"),
            ErrorKind::PermanentDirectoryNotAvailable => Reply::new(ReplyCode::FileError, "Folder not found"),
            ErrorKind::PermanentDirectoryNotEmpty => Reply::new(ReplyCode::FileError, "Directory not empty"),
            ErrorKind::PermissionDenied => Reply::new(ReplyCode::FileError, "Permission denied"),
            ErrorKind::TransientFileNotAvailable => Reply::new(ReplyCode::TransientFileError, "File not available"),
            ErrorKind::LocalError => Reply::new(ReplyCode::LocalError, "Local error"),
            ErrorKind::InsufficientStorageSpaceError => Reply::new(ReplyCode::OutOfSpace, "Insufficient storage space"),
            ErrorKind::ExceededStorageAllocationError => Reply::new(ReplyCode::ExceededStorageAllocation, "Exceeded storage allocation"),
            ErrorKind::FileNameNotAllowedError => Reply::new(ReplyCode::BadFileName, "File name not allowed"),
            ErrorKind::ConnectionClosed => Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted"),
            ErrorKind::CommandNotImplemented => Reply::new(ReplyCode::CommandNotImplemented, "Command not implemented"),
        }
    }
}
