//! Defines the service provider interface for storage back-end implementors.

use super::error::Error;
use crate::auth::UserDetail;
use crate::storage::ErrorKind;
use async_trait::async_trait;
use std::{
    fmt::{self, Debug, Formatter, Write},
    result,
    time::SystemTime,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Result type used by traits in this module
pub type Result<T> = result::Result<T, Error>;

/// Represents the metadata of a file in the storage back-end.
pub trait Metadata {
    /// Returns the length (size) of the file in bytes.
    fn len(&self) -> u64;

    /// Returns `self.len() == 0`.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the path is a directory.
    fn is_dir(&self) -> bool;

    /// Returns true if the path is a file.
    fn is_file(&self) -> bool;

    /// Returns the last modified time of the path.
    fn modified(&self) -> Result<SystemTime>;

    /// Returns the `gid` of the file.
    fn gid(&self) -> u32;

    /// Returns the `uid` of the file.
    fn uid(&self) -> u32;

    /// Returns the number of links to the file. The default implementation
    /// always returns `1`.
    fn links(&self) -> u64 {
        1
    }

    /// Returns the `permissions` of the file. The default implementation
    /// assumes unix permissions and defaults to "rw-r--r--" (octal 644).
    fn permissions(&self) -> Permissions {
        Permissions(0o644)
    }
}

/// Represents the permissions of a file in the storage back-end.
pub struct Permissions(pub u32);

const PERM_READ: u32 = 0b100100100;
const PERM_WRITE: u32 = 0b010010010;
const PERM_EXEC: u32 = 0b001001001;
const PERM_USER: u32 = 0b111000000;
const PERM_GROUP: u32 = 0b000111000;
const PERM_OTHERS: u32 = 0b000000111;

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char(if self.0 & PERM_USER & PERM_READ > 0 { 'r' } else { '-' })?;
        f.write_char(if self.0 & PERM_USER & PERM_WRITE > 0 { 'w' } else { '-' })?;
        f.write_char(if self.0 & PERM_USER & PERM_EXEC > 0 { 'x' } else { '-' })?;
        f.write_char(if self.0 & PERM_GROUP & PERM_READ > 0 { 'r' } else { '-' })?;
        f.write_char(if self.0 & PERM_GROUP & PERM_WRITE > 0 { 'w' } else { '-' })?;
        f.write_char(if self.0 & PERM_GROUP & PERM_EXEC > 0 { 'x' } else { '-' })?;
        f.write_char(if self.0 & PERM_OTHERS & PERM_READ > 0 { 'r' } else { '-' })?;
        f.write_char(if self.0 & PERM_OTHERS & PERM_WRITE > 0 { 'w' } else { '-' })?;
        f.write_char(if self.0 & PERM_OTHERS & PERM_EXEC > 0 { 'x' } else { '-' })?;
        Ok(())
    }
}

/// Resolves numeric owner and group ids from file metadata into the names
/// shown in directory listings. Lookups that return `None` render as the
/// conventional `ftp`.
#[async_trait]
pub trait NameResolver: Send + Sync + Debug {
    /// The login name for the given uid, if known.
    async fn username(&self, _uid: u32) -> Option<String> {
        None
    }

    /// The group name for the given gid, if known.
    async fn groupname(&self, _gid: u32) -> Option<String> {
        None
    }
}

/// The default [`NameResolver`]: it knows no names, so every listing entry
/// shows `ftp ftp`.
#[derive(Debug)]
pub struct StaticNameResolver;

#[async_trait]
impl NameResolver for StaticNameResolver {}

/// The `StorageBackend` trait can be implemented to create custom FTP
/// virtual file systems. Once implemented it needs to be registered with the
/// [`Server`](crate::Server) on construction.
///
/// Paths given to a backend are always absolute within the backend
/// (they start with `/`) and are already normalised: they contain no `.` or
/// `..` segments.
#[async_trait]
pub trait StorageBackend<User: UserDetail>: Send + Sync + Debug {
    /// The concrete type of the _metadata_ used by this storage backend.
    type Metadata: Metadata + Sync + Send;

    /// Restrict the backend's capabilities commensurate with the provided
    /// [`UserDetail`](crate::auth::UserDetail).
    ///
    /// Once restricted, it may never be unrestricted.
    fn enter(&mut self, _user_detail: &User) -> std::io::Result<()> {
        Ok(())
    }

    /// Implement to set the name of the storage back-end. By default it
    /// returns the type signature.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns the `Metadata` for the given file or directory.
    async fn metadata(&self, user: &User, path: &str) -> Result<Self::Metadata>;

    /// Returns the names of the entries in the given directory.
    async fn readdir(&self, user: &User, path: &str) -> Result<Vec<String>>;

    /// Opens the given file for reading, returning a stream of its contents.
    async fn get(&self, user: &User, path: &str) -> Result<Box<dyn AsyncRead + Send + Sync + Unpin>>;

    /// Returns the whole content of the given file. The default
    /// implementation slurps the stream returned by
    /// [`get`](StorageBackend::get).
    async fn read_file(&self, user: &User, path: &str) -> Result<Vec<u8>> {
        let mut reader = self.get(user, path).await?;
        let mut buf: Vec<u8> = Vec::new();
        reader.read_to_end(&mut buf).await.map_err(Error::from)?;
        Ok(buf)
    }

    /// Opens the given file for writing, truncating it unless `append` is
    /// set. The file is created if it does not exist, with mode 644 where
    /// the backend has a notion of modes.
    async fn put(&self, user: &User, path: &str, append: bool) -> Result<Box<dyn AsyncWrite + Send + Sync + Unpin>>;

    /// Writes the given bytes to the given file in one go. The default
    /// implementation drains into the stream returned by
    /// [`put`](StorageBackend::put).
    async fn write_file(&self, user: &User, path: &str, contents: &[u8], append: bool) -> Result<u64> {
        let mut writer = self.put(user, path, append).await?;
        writer.write_all(contents).await.map_err(Error::from)?;
        writer.shutdown().await.map_err(Error::from)?;
        Ok(contents.len() as u64)
    }

    /// Deletes the file at the given path.
    async fn del(&self, user: &User, path: &str) -> Result<()>;

    /// Renames the given file to the given new filename.
    async fn rename(&self, user: &User, from: &str, to: &str) -> Result<()>;

    /// Creates the given directory.
    async fn mkd(&self, user: &User, path: &str) -> Result<()>;

    /// Deletes the given directory.
    async fn rmd(&self, user: &User, path: &str) -> Result<()>;
}

// Maps IO errors to FTP errors in a sensible way.
// We try to capture all the permanent failures.
// The rest is assumed to be 'retryable' so they map to 4xx FTP replies, in
// this case a LocalError
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = err.kind();
        #[cfg(unix)]
        let raw_os_error = err.raw_os_error();
        #[cfg(not(unix))]
        let raw_os_error: Option<i32> = None;
        match (kind, raw_os_error) {
            (std::io::ErrorKind::NotFound, _) => Error::new(ErrorKind::PermanentFileNotAvailable, err),
            // Could also be a directory, but we don't know
            (std::io::ErrorKind::AlreadyExists, _) => Error::new(ErrorKind::PermanentFileNotAvailable, err),
            (std::io::ErrorKind::PermissionDenied, _) => Error::new(ErrorKind::PermissionDenied, err),
            #[cfg(unix)]
            (_, Some(libc::ENOTEMPTY)) => Error::new(ErrorKind::PermanentDirectoryNotEmpty, err),
            #[cfg(unix)]
            (_, Some(libc::ENOTDIR)) => Error::new(ErrorKind::PermanentDirectoryNotAvailable, err),
            #[cfg(unix)]
            (_, Some(libc::EISDIR) | Some(libc::EFBIG) | Some(libc::ESPIPE) | Some(libc::ENAMETOOLONG) | Some(libc::ELOOP)) => {
                Error::new(ErrorKind::PermanentFileNotAvailable, err)
            }
            #[cfg(unix)]
            (_, Some(libc::ENOSPC)) => Error::new(ErrorKind::InsufficientStorageSpaceError, err),
            // Read-only filesystem can be considered a permission error
            #[cfg(unix)]
            (_, Some(libc::EROFS)) => Error::new(ErrorKind::PermissionDenied, err),
            // Retryable: client most likely forcefully aborted the connection
            // or there was a network issue
            (std::io::ErrorKind::ConnectionReset, _) => Error::new(ErrorKind::ConnectionClosed, err),
            // Retryable: client most likely intentionally closed the connection
            (std::io::ErrorKind::BrokenPipe, _) => Error::new(ErrorKind::ConnectionClosed, err),
            (std::io::ErrorKind::ConnectionAborted, _) => Error::new(ErrorKind::ConnectionClosed, err),
            // Other errors are assumed to be local transient problems,
            // retryable for the client
            _ => Error::new(ErrorKind::LocalError, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn permissions_render_as_rwx_triplets() {
        assert_eq!(format!("{}", Permissions(0o644)), "rw-r--r--");
        assert_eq!(format!("{}", Permissions(0o755)), "rwxr-xr-x");
        assert_eq!(format!("{}", Permissions(0o000)), "---------");
        assert_eq!(format!("{}", Permissions(0o777)), "rwxrwxrwx");
    }

    #[test]
    fn io_not_found_maps_to_permanent_file_not_available() {
        let err: Error = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert_eq!(err.kind(), ErrorKind::PermanentFileNotAvailable);
    }

    #[test]
    fn io_broken_pipe_maps_to_connection_closed() {
        let err: Error = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert_eq!(err.kind(), ErrorKind::ConnectionClosed);
    }
}
