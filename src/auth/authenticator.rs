//! The service provider interface (SPI) for auth

use super::UserDetail;

use async_trait::async_trait;
use thiserror::Error;

/// The error type returned by [`Authenticator`] implementations.
#[derive(Debug, Error)]
#[error("authentication error: {message}")]
pub struct AuthenticationError {
    message: String,
    #[source]
    source: Option<crate::BoxError>,
}

impl AuthenticationError {
    /// Creates a new authentication error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        AuthenticationError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new authentication error with the given message and underlying cause.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AuthenticationError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Defines the requirements for authentication implementations.
#[async_trait]
pub trait Authenticator<User>: Sync + Send + std::fmt::Debug
where
    User: UserDetail,
{
    /// Tells if the given username is acceptable at the `USER` stage, before
    /// any password has been seen. The default implementation accepts every
    /// username and lets [`authenticate`](Authenticator::authenticate) do
    /// the real work.
    async fn accept_user(&self, _username: &str) -> Result<(), AuthenticationError> {
        Ok(())
    }

    /// Authenticate the given user with the given password.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthenticationError>;
}
