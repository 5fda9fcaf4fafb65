#![deny(missing_docs)]

//! Contains the traits used by the [`Server`](crate::Server) to authenticate
//! users and to decide where their sessions live in the storage backend.
//!
//! Defines the common interface that can be implemented for a multitude of
//! authentication backends, e.g. *LDAP* or *PAM*. You can define your own
//! implementation to integrate the server with whatever authentication
//! mechanism you need. For example, to define an `Authenticator` that will
//! randomly decide:
//!
//! ```no_run
//! use ftpserve::auth::{Authenticator, AuthenticationError, UserDetail};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! struct RandomAuthenticator;
//!
//! #[async_trait]
//! impl Authenticator<RandomUser> for RandomAuthenticator {
//!     async fn authenticate(&self, _username: &str, _password: &str) -> Result<RandomUser, AuthenticationError> {
//!         Ok(RandomUser {})
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct RandomUser;
//!
//! impl UserDetail for RandomUser {}
//!
//! impl std::fmt::Display for RandomUser {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "RandomUser")
//!     }
//! }
//! ```

pub mod anonymous;
pub use anonymous::AnonymousAuthenticator;

pub(crate) mod authenticator;
pub use authenticator::{AuthenticationError, Authenticator};

mod roots;
pub use roots::{DefaultRootResolver, RootResolver};

mod user;
pub use user::{DefaultUser, UserDetail};
