//! A [`StorageBackend`] that serves a directory tree on local disk, like a
//! traditional FTP server.

use super::error::Error;
use super::storage_backend::{Metadata, Permissions, Result, StorageBackend};
use crate::auth::UserDetail;
use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};
use tokio::io::{AsyncRead, AsyncWrite};

/// The Filesystem struct is an implementation of the [`StorageBackend`] trait
/// that keeps its files inside a specific root directory on local disk.
///
/// When the root is set to `/srv/ftp` and a client asks for `/hello.txt`,
/// the server will send it `/srv/ftp/hello.txt`.
#[derive(Debug)]
pub struct Filesystem {
    root: PathBuf,
}

/// Metadata for the [`Filesystem`] storage back-end.
#[derive(Debug)]
pub struct Meta {
    inner: std::fs::Metadata,
}

impl Filesystem {
    /// Create a new Filesystem backend with the given root. No operations can
    /// take place outside of the root.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Filesystem { root: root.into() }
    }

    // Server paths are absolute within the backend; here they become paths
    // under the root directory. The caller has already normalised away any
    // `..` segments.
    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl<User: UserDetail> StorageBackend<User> for Filesystem {
    type Metadata = Meta;

    fn name(&self) -> &str {
        "Filesystem"
    }

    async fn metadata(&self, _user: &User, path: &str) -> Result<Self::Metadata> {
        let fs_meta = tokio::fs::symlink_metadata(self.full_path(path)).await?;
        Ok(Meta { inner: fs_meta })
    }

    async fn readdir(&self, _user: &User, path: &str) -> Result<Vec<String>> {
        let mut dir = tokio::fs::read_dir(self.full_path(path)).await?;
        let mut names: Vec<String> = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn get(&self, _user: &User, path: &str) -> Result<Box<dyn AsyncRead + Send + Sync + Unpin>> {
        let file = tokio::fs::File::open(self.full_path(path)).await?;
        Ok(Box::new(tokio::io::BufReader::with_capacity(4096, file)))
    }

    async fn read_file(&self, _user: &User, path: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.full_path(path)).await?)
    }

    async fn put(&self, _user: &User, path: &str, append: bool) -> Result<Box<dyn AsyncWrite + Send + Sync + Unpin>> {
        let file = open_for_writing(&self.full_path(path), append).await?;
        Ok(Box::new(tokio::io::BufWriter::with_capacity(4096, file)))
    }

    async fn write_file(&self, _user: &User, path: &str, contents: &[u8], append: bool) -> Result<u64> {
        use tokio::io::AsyncWriteExt;
        let mut file = open_for_writing(&self.full_path(path), append).await?;
        file.write_all(contents).await?;
        file.flush().await?;
        Ok(contents.len() as u64)
    }

    async fn del(&self, _user: &User, path: &str) -> Result<()> {
        Ok(tokio::fs::remove_file(self.full_path(path)).await?)
    }

    async fn rename(&self, _user: &User, from: &str, to: &str) -> Result<()> {
        Ok(tokio::fs::rename(self.full_path(from), self.full_path(to)).await?)
    }

    async fn mkd(&self, _user: &User, path: &str) -> Result<()> {
        Ok(tokio::fs::create_dir(self.full_path(path)).await?)
    }

    async fn rmd(&self, _user: &User, path: &str) -> Result<()> {
        Ok(tokio::fs::remove_dir(self.full_path(path)).await?)
    }
}

async fn open_for_writing(path: &Path, append: bool) -> std::io::Result<tokio::fs::File> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    #[cfg(unix)]
    options.mode(0o644);
    options.open(path).await
}

impl Metadata for Meta {
    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn is_dir(&self) -> bool {
        self.inner.is_dir()
    }

    fn is_file(&self) -> bool {
        self.inner.is_file()
    }

    fn modified(&self) -> Result<SystemTime> {
        self.inner.modified().map_err(Error::from)
    }

    #[cfg(unix)]
    fn uid(&self) -> u32 {
        use std::os::unix::fs::MetadataExt;
        self.inner.uid()
    }

    #[cfg(not(unix))]
    fn uid(&self) -> u32 {
        0
    }

    #[cfg(unix)]
    fn gid(&self) -> u32 {
        use std::os::unix::fs::MetadataExt;
        self.inner.gid()
    }

    #[cfg(not(unix))]
    fn gid(&self) -> u32 {
        0
    }

    #[cfg(unix)]
    fn links(&self) -> u64 {
        use std::os::unix::fs::MetadataExt;
        self.inner.nlink()
    }

    #[cfg(unix)]
    fn permissions(&self) -> Permissions {
        use std::os::unix::fs::MetadataExt;
        Permissions(self.inner.mode() & 0o777)
    }

    #[cfg(not(unix))]
    fn permissions(&self) -> Permissions {
        Permissions(0o644)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DefaultUser;
    use crate::storage::ErrorKind;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn metadata_of_missing_file_is_permanent_not_available() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(dir.path());
        let err = fs.metadata(&DefaultUser {}, "/nope.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermanentFileNotAvailable);
    }

    #[tokio::test]
    async fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(dir.path());
        fs.write_file(&DefaultUser {}, "/hello.txt", b"hi there", false).await.unwrap();
        let contents = fs.read_file(&DefaultUser {}, "/hello.txt").await.unwrap();
        assert_eq!(contents, b"hi there");

        fs.write_file(&DefaultUser {}, "/hello.txt", b", again", true).await.unwrap();
        let contents = fs.read_file(&DefaultUser {}, "/hello.txt").await.unwrap();
        assert_eq!(contents, b"hi there, again");
    }

    #[tokio::test]
    async fn readdir_lists_created_entries() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(dir.path());
        fs.mkd(&DefaultUser {}, "/sub").await.unwrap();
        fs.write_file(&DefaultUser {}, "/a.txt", b"a", false).await.unwrap();
        let mut names = fs.readdir(&DefaultUser {}, "/").await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "sub".to_string()]);
        assert!(fs.metadata(&DefaultUser {}, "/sub").await.unwrap().is_dir());
    }

    #[tokio::test]
    async fn rename_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(dir.path());
        fs.write_file(&DefaultUser {}, "/a.txt", b"a", false).await.unwrap();
        fs.rename(&DefaultUser {}, "/a.txt", "/b.txt").await.unwrap();
        assert!(fs.metadata(&DefaultUser {}, "/a.txt").await.is_err());
        fs.del(&DefaultUser {}, "/b.txt").await.unwrap();
        assert!(fs.metadata(&DefaultUser {}, "/b.txt").await.is_err());
    }
}
