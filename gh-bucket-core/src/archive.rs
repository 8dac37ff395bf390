//! Cloning a repository and packing the clone into an in-memory zip archive.

use async_trait::async_trait;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::contract::Archiver;
use crate::error::FetchError;

pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(600);

/// Directory name of the bare clone inside each scratch directory.
const CLONE_DIR: &str = "repobuf";

/// [`Archiver`] that shells out to `git clone --bare` and zips the result.
///
/// Each call clones into its own temporary directory below `scratch_root`; the directory
/// is removed when the call returns, whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct GitArchiver {
    scratch_root: PathBuf,
    clone_timeout: Duration,
}

impl GitArchiver {
    pub fn new(scratch_root: impl Into<PathBuf>, clone_timeout: Duration) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            clone_timeout,
        }
    }

    async fn clone_bare(&self, clone_url: &str, dest: &Path) -> Result<(), FetchError> {
        let mut command = Command::new("git");
        command
            .arg("clone")
            .arg("--bare")
            .arg("--quiet")
            .arg(clone_url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let status = match tokio::time::timeout(self.clone_timeout, command.status()).await {
            Ok(status) => status.map_err(FetchError::Spawn)?,
            Err(_) => {
                error!(repo_url = clone_url, timeout = ?self.clone_timeout, "git clone timed out");
                return Err(FetchError::CloneTimeout {
                    url: clone_url.to_owned(),
                    timeout: self.clone_timeout,
                });
            }
        };

        if !status.success() {
            error!(repo_url = clone_url, %status, "git clone exited with non-zero code");
            return Err(FetchError::Clone {
                url: clone_url.to_owned(),
                status: status.to_string(),
            });
        }
        info!(repo_url = clone_url, path = %dest.display(), "Cloned bare repository");
        Ok(())
    }
}

impl Default for GitArchiver {
    fn default() -> Self {
        Self::new(std::env::temp_dir(), DEFAULT_CLONE_TIMEOUT)
    }
}

#[async_trait]
impl Archiver for GitArchiver {
    async fn archive(&self, clone_url: &str) -> Result<Vec<u8>, FetchError> {
        let scratch_root = self.scratch_root.clone();
        let scratch = tokio::task::spawn_blocking(move || -> std::io::Result<tempfile::TempDir> {
            fs::create_dir_all(&scratch_root)?;
            tempfile::Builder::new()
                .prefix("gh-bucket-")
                .tempdir_in(&scratch_root)
        })
        .await?
        .map_err(FetchError::Scratch)?;
        let clone_path = scratch.path().join(CLONE_DIR);

        self.clone_bare(clone_url, &clone_path).await?;

        let bytes = tokio::task::spawn_blocking(move || zip_tree(&clone_path)).await??;
        debug!(repo_url = clone_url, size = bytes.len(), "Archived repository");
        // `scratch` is dropped here, removing the clone.
        Ok(bytes)
    }
}

/// Zips every regular file below `root`, keyed by its `/`-separated path relative to
/// `root`. Directories and symlinks are not entries.
pub fn zip_tree(root: &Path) -> Result<Vec<u8>, FetchError> {
    let mut files = Vec::new();
    collect_files(root, &mut files)?;
    files.sort();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for path in &files {
        let name = entry_name(root, path);
        let content = fs::read(path).map_err(|source| FetchError::Read {
            path: path.clone(),
            source,
        })?;
        zip.start_file(name, file_options(path)?)?;
        zip.write_all(&content).map_err(ZipError::from)?;
    }
    let cursor = zip.finish()?;
    debug!(root = %root.display(), files = files.len(), "Built zip archive");
    Ok(cursor.into_inner())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), FetchError> {
    let walk_err = |source: std::io::Error| FetchError::Walk {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(walk_err)? {
        let entry = entry.map_err(walk_err)?;
        let file_type = entry.file_type().map_err(walk_err)?;
        if file_type.is_dir() {
            collect_files(&entry.path(), files)?;
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    Ok(())
}

fn entry_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn file_options(path: &Path) -> Result<SimpleFileOptions, FetchError> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = fs::metadata(path).map_err(|source| FetchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(metadata.permissions().mode()))
}

#[cfg(not(unix))]
fn file_options(_path: &Path) -> Result<SimpleFileOptions, FetchError> {
    Ok(SimpleFileOptions::default().compression_method(CompressionMethod::Deflated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_are_relative_and_slash_separated() {
        let root = Path::new("/tmp/scratch/repobuf");
        let path = root.join("refs").join("heads").join("main");
        assert_eq!(entry_name(root, &path), "refs/heads/main");
    }

    #[tokio::test]
    async fn failed_clone_leaves_no_scratch_behind() {
        let scratch_root = tempfile::tempdir().unwrap();
        let archiver = GitArchiver::new(scratch_root.path(), Duration::from_secs(30));
        let missing = scratch_root.path().join("does-not-exist.git");

        let result = archiver.archive(&missing.to_string_lossy()).await;

        assert!(
            matches!(
                result,
                Err(FetchError::Clone { .. }) | Err(FetchError::Spawn(_))
            ),
            "expected clone failure, got {result:?}"
        );
        let leftovers: Vec<_> = fs::read_dir(scratch_root.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("gh-bucket-"))
            .collect();
        assert!(leftovers.is_empty(), "scratch dirs left: {leftovers:?}");
    }

    #[tokio::test]
    async fn missing_scratch_root_is_created() {
        let parent = tempfile::tempdir().unwrap();
        let scratch_root = parent.path().join("nested").join("scratch");
        let archiver = GitArchiver::new(&scratch_root, Duration::from_secs(30));
        let missing = parent.path().join("does-not-exist.git");

        let result = archiver.archive(&missing.to_string_lossy()).await;

        assert!(
            !matches!(result, Err(FetchError::Scratch(_))),
            "scratch root should have been created, got {result:?}"
        );
        assert!(scratch_root.is_dir());
    }

    #[tokio::test]
    async fn scratch_root_that_is_a_file_is_a_scratch_error() {
        let parent = tempfile::tempdir().unwrap();
        let blocker = parent.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let archiver = GitArchiver::new(&blocker, Duration::from_secs(30));

        let result = archiver.archive("https://github.com/octocat/a.git").await;

        assert!(
            matches!(result, Err(FetchError::Scratch(_))),
            "expected scratch error, got {result:?}"
        );
    }
}
