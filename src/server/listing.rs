//! Directory-listing machinery: wildcard expansion against the storage
//! backend, owner/group resolution, sorting and the classic `ls -l` style
//! line format.

use crate::auth::UserDetail;
use crate::options::{FilenameSortFunc, FilenameSortMap};
use crate::storage::{Metadata, NameResolver, Result, StorageBackend};
use chrono::prelude::{DateTime, Utc};
use futures_util::StreamExt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

// Shown in listings when the resolver does not know a uid/gid.
const UNKNOWN_OWNER: &str = "ftp";

/// Per-server listing behaviour, snapshotted from the builder.
#[derive(Clone)]
pub struct ListingConfig {
    pub hide_dot_files: bool,
    pub max_stats_at_once: usize,
    pub dont_sort_filenames: bool,
    pub filename_sort_map: Option<Arc<FilenameSortMap>>,
    pub filename_sort_func: Option<Arc<FilenameSortFunc>>,
}

/// One listing entry: the name shown to the client paired with its stat
/// result.
pub struct ListEntry<M> {
    pub name: String,
    pub metadata: M,
}

/// Glob, hide and sort in one step: what every listing command does before
/// rendering its lines.
pub async fn gather<S, U>(storage: &Arc<S>, user: &Arc<Option<U>>, path: &str, config: &ListingConfig) -> Result<Vec<ListEntry<S::Metadata>>>
where
    S: StorageBackend<U>,
    U: UserDetail,
{
    let entries = glob(storage, user, path, config.max_stats_at_once, false).await?;
    let mut entries = filter_hidden(entries, config);
    sort_entries(&mut entries, config);
    Ok(entries)
}

/// Expands a listing argument to its entries. A path without wildcards
/// yields the entry itself when it is a file, or the directory's contents
/// when it is a directory. `*` and `?` in the final segment match against
/// one directory level. Stat calls run with at most `max_stats` in flight.
pub async fn glob<S, U>(storage: &Arc<S>, user: &Arc<Option<U>>, path: &str, max_stats: usize, no_wildcards: bool) -> Result<Vec<ListEntry<S::Metadata>>>
where
    S: StorageBackend<U>,
    U: UserDetail,
{
    let user_ref = match user.as_ref() {
        Some(u) => u,
        None => return Ok(vec![]),
    };

    let (dir, pattern) = split_wildcard(path);
    if !no_wildcards && pattern.is_some() {
        let pattern = pattern.unwrap();
        let names = storage.readdir(user_ref, dir).await?;
        let matching: Vec<String> = names.into_iter().filter(|n| wildcard_match(pattern, n)).collect();
        return stat_all(storage, user_ref, dir, matching, max_stats).await;
    }

    let meta = storage.metadata(user_ref, path).await?;
    if meta.is_dir() {
        let names = storage.readdir(user_ref, path).await?;
        stat_all(storage, user_ref, path, names, max_stats).await
    } else {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Ok(vec![ListEntry { name, metadata: meta }])
    }
}

async fn stat_all<S, U>(storage: &Arc<S>, user: &U, dir: &str, names: Vec<String>, max_stats: usize) -> Result<Vec<ListEntry<S::Metadata>>>
where
    S: StorageBackend<U>,
    U: UserDetail,
{
    let base = dir.trim_end_matches('/');
    let stats: Vec<(String, Result<S::Metadata>)> = futures_util::stream::iter(names)
        .map(|name| async move {
            let full = format!("{}/{}", base, name);
            let meta = storage.metadata(user, &full).await;
            (name, meta)
        })
        .buffered(max_stats.max(1))
        .collect()
        .await;

    // Entries that disappear between readdir and stat are skipped.
    Ok(stats
        .into_iter()
        .filter_map(|(name, meta)| meta.ok().map(|metadata| ListEntry { name, metadata }))
        .collect())
}

// Splits a path into its directory part and a wildcard pattern, if the last
// segment contains one.
fn split_wildcard(path: &str) -> (&str, Option<&str>) {
    let (dir, last) = match path.rfind('/') {
        Some(i) => (&path[..i.max(1)], &path[i + 1..]),
        None => ("/", path),
    };
    if last.contains('*') || last.contains('?') {
        (dir, Some(last))
    } else {
        (path, None)
    }
}

/// Matches `*` (any run, including empty) and `?` (any single character)
/// against one path segment. Classic two-pointer scan with star backtracking.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Applies the configured ordering: the default comparator sorts on a
/// case-folded key, `filename_sort_map` swaps out the key extractor,
/// `filename_sort_func` swaps out the comparator, and `dont_sort_filenames`
/// leaves the backend order alone.
pub fn sort_entries<M>(entries: &mut [ListEntry<M>], config: &ListingConfig) {
    if config.dont_sort_filenames {
        return;
    }
    if let Some(cmp) = &config.filename_sort_func {
        entries.sort_by(|a, b| cmp.as_ref()(&a.name, &b.name));
        return;
    }
    match &config.filename_sort_map {
        Some(key) => entries.sort_by_key(|e| key.as_ref()(&e.name)),
        None => entries.sort_by_key(|e| (e.name.to_lowercase(), e.name.clone())),
    }
}

/// Drops names starting with a dot when the server is configured to hide
/// them.
pub fn filter_hidden<M>(entries: Vec<ListEntry<M>>, config: &ListingConfig) -> Vec<ListEntry<M>> {
    if !config.hide_dot_files {
        return entries;
    }
    entries.into_iter().filter(|e| !e.name.starts_with('.')).collect()
}

/// Formats the detailed (LIST/STAT) lines for the given entries, resolving
/// owner and group names with at most `max_stats_at_once` lookups in flight.
pub async fn format_detailed<M>(entries: &[ListEntry<M>], resolver: &Arc<dyn NameResolver>, config: &ListingConfig) -> Vec<String>
where
    M: Metadata + Sync,
{
    let mut futures: Vec<Pin<Box<dyn Future<Output = String> + Send + '_>>> = Vec::with_capacity(entries.len());
    for entry in entries {
        futures.push(Box::pin(format_detailed_one(entry, resolver)));
    }
    futures_util::stream::iter(futures).buffered(config.max_stats_at_once.max(1)).collect().await
}

async fn format_detailed_one<M: Metadata + Sync>(entry: &ListEntry<M>, resolver: &Arc<dyn NameResolver>) -> String {
    let owner = resolver.username(entry.metadata.uid()).await.unwrap_or_else(|| UNKNOWN_OWNER.to_string());
    let group = resolver.groupname(entry.metadata.gid()).await.unwrap_or_else(|| UNKNOWN_OWNER.to_string());
    format_long(entry, &owner, &group)
}

// One `ls -l` style line. The date field is always "Mmm dd HH:MM" with a
// space padded day, matching what FTP clients parse.
fn format_long<M: Metadata>(entry: &ListEntry<M>, owner: &str, group: &str) -> String {
    let file_type = if entry.metadata.is_dir() { 'd' } else { '-' };
    let modified: String = entry
        .metadata
        .modified()
        .map(|m| DateTime::<Utc>::from(m).format("%b %e %H:%M").to_string())
        .unwrap_or_else(|_| "--- -- --:--".to_string());
    format!(
        "{}{} {} {} {} {:>12} {} {}",
        file_type,
        entry.metadata.permissions(),
        entry.metadata.links(),
        owner,
        group,
        entry.metadata.len(),
        modified,
        entry.name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Permissions, Result as StorageResult};
    use pretty_assertions::assert_eq;
    use std::time::{Duration, SystemTime};

    struct FakeMeta {
        dir: bool,
        len: u64,
    }

    impl Metadata for FakeMeta {
        fn len(&self) -> u64 {
            self.len
        }
        fn is_dir(&self) -> bool {
            self.dir
        }
        fn is_file(&self) -> bool {
            !self.dir
        }
        fn modified(&self) -> StorageResult<SystemTime> {
            // 2021-03-07 13:45:00 UTC
            Ok(SystemTime::UNIX_EPOCH + Duration::from_secs(1_615_124_700))
        }
        fn gid(&self) -> u32 {
            0
        }
        fn uid(&self) -> u32 {
            0
        }
        fn permissions(&self) -> Permissions {
            Permissions(0o644)
        }
    }

    fn config() -> ListingConfig {
        ListingConfig {
            hide_dot_files: false,
            max_stats_at_once: 4,
            dont_sort_filenames: false,
            filename_sort_map: None,
            filename_sort_func: None,
        }
    }

    fn entries(names: &[&str]) -> Vec<ListEntry<FakeMeta>> {
        names
            .iter()
            .map(|n| ListEntry {
                name: n.to_string(),
                metadata: FakeMeta { dir: false, len: 1 },
            })
            .collect()
    }

    #[test]
    fn wildcard_star_and_question() {
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("*.txt", "notes.txt"));
        assert!(!wildcard_match("*.txt", "notes.txt.bak"));
        assert!(wildcard_match("data-?", "data-1"));
        assert!(!wildcard_match("data-?", "data-10"));
        assert!(wildcard_match("a*b*c", "aXXbYYc"));
        assert!(!wildcard_match("a*b*c", "acb"));
        assert!(wildcard_match("", ""));
        assert!(!wildcard_match("", "x"));
    }

    #[test]
    fn split_wildcard_finds_pattern_in_last_segment() {
        assert_eq!(split_wildcard("/pub/*.txt"), ("/pub", Some("*.txt")));
        assert_eq!(split_wildcard("/*.txt"), ("/", Some("*.txt")));
        assert_eq!(split_wildcard("/pub/notes.txt"), ("/pub/notes.txt", None));
    }

    #[test]
    fn default_sort_is_case_folded() {
        let mut list = entries(&["Zebra", "apple", "Apple", "mango"]);
        sort_entries(&mut list, &config());
        let names: Vec<&str> = list.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "apple", "Zebra", "mango"]);
    }

    #[test]
    fn sort_overrides() {
        let mut cfg = config();
        cfg.filename_sort_func = Some(Arc::new(|a: &str, b: &str| b.cmp(a)));
        let mut list = entries(&["a", "b", "c"]);
        sort_entries(&mut list, &cfg);
        let names: Vec<&str> = list.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);

        let mut cfg = config();
        cfg.dont_sort_filenames = true;
        let mut list = entries(&["b", "a"]);
        sort_entries(&mut list, &cfg);
        assert_eq!(list[0].name, "b");
    }

    #[test]
    fn hidden_files_are_filtered_when_configured() {
        let mut cfg = config();
        cfg.hide_dot_files = true;
        let filtered = filter_hidden(entries(&[".hidden", "shown"]), &cfg);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "shown");
    }

    #[test]
    fn long_format_shape() {
        let entry = ListEntry {
            name: "notes.txt".to_string(),
            metadata: FakeMeta { dir: false, len: 4096 },
        };
        let line = format_long(&entry, "alice", "staff");
        assert_eq!(line, "-rw-r--r-- 1 alice staff         4096 Mar  7 13:45 notes.txt");

        let dir_entry = ListEntry {
            name: "pub".to_string(),
            metadata: FakeMeta { dir: true, len: 0 },
        };
        let line = format_long(&dir_entry, "ftp", "ftp");
        assert!(line.starts_with('d'));
    }
}
