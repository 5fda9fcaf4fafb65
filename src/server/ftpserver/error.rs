//! Contains the error type returned when setting up or running a
//! [`Server`](crate::Server).

use derive_more::Display;
use thiserror::Error;

/// The error type returned by the [`Server`](crate::Server) and
/// [`ServerBuilder`](crate::ServerBuilder).
#[derive(Debug, Error)]
#[error("server error: {kind}")]
pub struct ServerError {
    kind: ServerErrorKind,
    #[source]
    source: Option<crate::BoxError>,
}

/// A list specifying categories of server start-up and runtime errors.
#[derive(Debug, Display, Eq, PartialEq)]
pub enum ServerErrorKind {
    /// The TLS certificates or private key could not be loaded.
    #[display("failed to load TLS configuration")]
    TlsConfig,
    /// Binding to the control address failed.
    #[display("failed to bind the control address")]
    Bind,
    /// Accepting a control connection failed.
    #[display("failed to accept a control connection")]
    Accept,
    /// The builder was given an impossible combination of options.
    #[display("invalid server configuration")]
    Config,
}

impl ServerError {
    pub(crate) fn new(kind: ServerErrorKind) -> Self {
        ServerError { kind, source: None }
    }

    pub(crate) fn with_source<E>(kind: ServerErrorKind, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ServerError {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> &ServerErrorKind {
        &self.kind
    }
}
