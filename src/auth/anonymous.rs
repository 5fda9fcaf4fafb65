//! This module provides an anonymous authenticator

use crate::auth::{AuthenticationError, Authenticator, DefaultUser};
use async_trait::async_trait;

/// [`Authenticator`] implementation that simply allows everyone.
///
/// # Example
///
/// ```rust
/// # #[tokio::main]
/// # async fn main() {
/// use ftpserve::auth::{Authenticator, AnonymousAuthenticator};
///
/// let my_auth = AnonymousAuthenticator {};
/// assert!(my_auth.authenticate("Finn", "I ❤️ PB").await.is_ok());
/// # }
/// ```
#[derive(Debug)]
pub struct AnonymousAuthenticator;

#[async_trait]
impl Authenticator<DefaultUser> for AnonymousAuthenticator {
    async fn authenticate(&self, _username: &str, _password: &str) -> Result<DefaultUser, AuthenticationError> {
        Ok(DefaultUser {})
    }
}
