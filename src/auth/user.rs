use std::fmt::{self, Debug, Display, Formatter};

/// UserDetail defines the requirements for implementations that hold
/// _Security Subject_ information for use by the server.
///
/// Think information like general account information, account settings and
/// authorization information.
pub trait UserDetail: Send + Sync + Display + Debug {
    /// Tells if this subject's account is enabled. This default implementation
    /// simply returns true.
    fn account_enabled(&self) -> bool {
        true
    }
}

/// DefaultUser is a default implementation of the [`UserDetail`] trait that
/// doesn't hold any user information. Having a default implementation like
/// this allows for quicker prototyping with ftpserve because otherwise the
/// library user would have to implement the `UserDetail` trait first.
#[derive(Debug, PartialEq, Eq)]
pub struct DefaultUser;

impl UserDetail for DefaultUser {}

impl Display for DefaultUser {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "DefaultUser")
    }
}
