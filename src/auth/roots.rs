use super::UserDetail;

use async_trait::async_trait;
use std::io;

/// Resolves the storage root and the initial working directory for a freshly
/// authenticated user.
///
/// Both paths are server-relative: `/` refers to the top of whatever the
/// [`StorageBackend`](crate::storage::StorageBackend) exposes. The root acts
/// as a jail: every path a client supplies is resolved against the working
/// directory and then anchored below the root. An error from either method
/// aborts the login with a `421` reply and closes the control connection.
#[async_trait]
pub trait RootResolver<User>: Send + Sync + std::fmt::Debug
where
    User: UserDetail,
{
    /// The path, absolute within the storage backend, that acts as this
    /// user's filesystem root.
    async fn root(&self, _user: &User) -> io::Result<String> {
        Ok("/".to_string())
    }

    /// The server-relative path the session starts in.
    async fn initial_cwd(&self, _user: &User) -> io::Result<String> {
        Ok("/".to_string())
    }
}

/// A [`RootResolver`] that gives every user the whole backend (`/`) and
/// starts them at the top of it.
#[derive(Debug)]
pub struct DefaultRootResolver;

#[async_trait]
impl<User> RootResolver<User> for DefaultRootResolver where User: UserDetail {}
