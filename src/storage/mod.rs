#![deny(missing_docs)]

//! Contains the [`StorageBackend`] trait that can be implemented to create
//! virtual file systems for ftpserve, along with a ready made implementation
//! backed by a local directory tree ([`Filesystem`]).
//!
//! To create a new storage back-end:
//!
//! 1. Declare a dependency on the async-trait crate
//!
//! ```toml
//! async-trait = "0.1.50"
//! ```
//!
//! 2. Implement the [`StorageBackend`] trait and optionally the [`Metadata`]
//!    trait, then initialize the [`Server`](crate::Server) with it:
//!
//! ```no_run
//! # use ftpserve::storage::Filesystem;
//! let vfs_provider = Box::new(|| Filesystem::new("/srv/ftp"));
//! let server = ftpserve::ServerBuilder::new(vfs_provider);
//! ```

pub(crate) mod error;
pub use error::{Error, ErrorKind};

pub(crate) mod storage_backend;
pub use storage_backend::{Metadata, NameResolver, Permissions, Result, StaticNameResolver, StorageBackend};

pub(crate) mod filesystem;
pub use filesystem::{Filesystem, Meta};
