// SPDX-License-Identifier: Apache-2.0

//! Root-scoped file store.
//!
//! Every operation resolves the caller's relative path against a fixed,
//! canonical root and refuses anything that lands outside it before any
//! read or write happens. Writes are staged in a uniquely named sibling file
//! and renamed into place, so readers see either the old content or the new
//! content and never a mix. No in-process locking is used; concurrent
//! writers to the same path race on the rename and the last one wins.
//!
//! All I/O goes through `tokio::fs`, which offloads blocking calls to the
//! runtime's blocking pool.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::FileError;

/// Suffix of in-flight staging files; such entries are hidden from listings.
const STAGING_SUFFIX: &str = ".partial";

/// Longest slice of the target name kept in a staging name. The uuid and
/// affixes add 42 bytes, so the result fits in a 255-byte name.
const STAGING_STEM_MAX: usize = 64;

/// Metadata for one regular file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// File name (no directory part).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the platform reports one.
    pub modified: Option<DateTime<Utc>>,
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    /// Canonical path that was written.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes_written: u64,
    /// Whether an existing file was replaced.
    pub replaced: bool,
}

/// File access confined to a single root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`.
    ///
    /// The root is canonicalised once here and must be an existing directory.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, FileError> {
        let configured = root.as_ref();
        let invalid = |reason: String| FileError::InvalidRoot {
            root: configured.to_path_buf(),
            reason,
        };

        let root = fs::canonicalize(configured)
            .await
            .map_err(|e| invalid(e.to_string()))?;
        let meta = fs::metadata(&root)
            .await
            .map_err(|e| invalid(e.to_string()))?;
        if !meta.is_dir() {
            return Err(invalid("not a directory".to_string()));
        }

        debug!(root = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    /// The canonical root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `relative` to a canonical path inside the root.
    ///
    /// 1. Lexical pass: absolute paths, drive prefixes and `..` segments that
    ///    climb above the root are rejected outright.
    /// 2. The joined path is canonicalised (resolving `.`, `..` and symlinks)
    ///    and must equal the root or sit below it, compared component-wise.
    /// 3. If the target does not exist yet, its parent is canonicalised and
    ///    checked instead, and the final name is re-appended.
    ///
    /// # Errors
    ///
    /// - `PathEscapesRoot` if the path resolves outside the root
    /// - `NotFound` if neither the target nor its parent exists
    pub async fn resolve(&self, relative: &str) -> Result<PathBuf, FileError> {
        let escapes = || FileError::PathEscapesRoot {
            requested: relative.to_string(),
        };

        let rel = Path::new(relative);
        if !stays_below_root(rel) {
            return Err(escapes());
        }

        let joined = self.root.join(rel);
        match fs::canonicalize(&joined).await {
            Ok(canonical) => {
                if is_within(&self.root, &canonical) {
                    Ok(canonical)
                } else {
                    Err(escapes())
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.resolve_missing(relative, &joined).await
            }
            Err(e) => Err(FileError::from_io(relative, e)),
        }
    }

    /// Resolution for a target that does not exist (or is a dangling link).
    async fn resolve_missing(&self, relative: &str, joined: &Path) -> Result<PathBuf, FileError> {
        let name = match joined.components().next_back() {
            Some(Component::Normal(name)) => name.to_owned(),
            _ => {
                self.check_nearest_ancestor(relative, joined).await?;
                return Err(FileError::NotFound {
                    requested: relative.to_string(),
                });
            }
        };

        let parent = joined.parent().unwrap_or(&self.root);
        match fs::canonicalize(parent).await {
            Ok(canonical_parent) => {
                if is_within(&self.root, &canonical_parent) {
                    let candidate = canonical_parent.join(name);
                    self.check_dangling_link(relative, &candidate).await?;
                    Ok(candidate)
                } else {
                    Err(FileError::PathEscapesRoot {
                        requested: relative.to_string(),
                    })
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.check_nearest_ancestor(relative, joined).await?;
                Err(FileError::NotFound {
                    requested: relative.to_string(),
                })
            }
            Err(e) => Err(FileError::from_io(relative, e)),
        }
    }

    /// Fails with `PathEscapesRoot` if the deepest existing ancestor of
    /// `joined` resolves outside the root.
    async fn check_nearest_ancestor(&self, relative: &str, joined: &Path) -> Result<(), FileError> {
        if self.nearest_existing_within(joined.ancestors().skip(1)).await {
            Ok(())
        } else {
            Err(FileError::PathEscapesRoot {
                requested: relative.to_string(),
            })
        }
    }

    /// Fails with `PathEscapesRoot` if `candidate` is a dangling symlink
    /// whose target lies outside the root.
    async fn check_dangling_link(&self, relative: &str, candidate: &Path) -> Result<(), FileError> {
        let Ok(meta) = fs::symlink_metadata(candidate).await else {
            return Ok(());
        };
        if !meta.file_type().is_symlink() {
            return Ok(());
        }
        let link = fs::read_link(candidate)
            .await
            .map_err(|e| FileError::from_io(relative, e))?;

        // Relative targets are taken from the link's directory.
        let target = match candidate.parent() {
            Some(dir) => normalize(&dir.join(link)),
            None => normalize(&link),
        };
        if is_within(&self.root, &target) && self.nearest_existing_within(target.ancestors()).await {
            Ok(())
        } else {
            debug!(target = %target.display(), "Dangling link points outside root");
            Err(FileError::PathEscapesRoot {
                requested: relative.to_string(),
            })
        }
    }

    /// True if the first of `ancestors` that exists canonicalises inside the root.
    async fn nearest_existing_within<'a>(
        &self,
        ancestors: impl Iterator<Item = &'a Path>,
    ) -> bool {
        for ancestor in ancestors {
            if let Ok(canonical) = fs::canonicalize(ancestor).await {
                return is_within(&self.root, &canonical);
            }
        }
        true
    }

    /// Reads the whole file at `relative`.
    #[instrument(skip(self))]
    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, FileError> {
        let path = self.resolve(relative).await?;
        ensure_regular_file(relative, &path).await?;

        let bytes = fs::read(&path)
            .await
            .map_err(|e| FileError::from_io(relative, e))?;
        debug!(bytes = bytes.len(), "Read file");
        Ok(bytes)
    }

    /// Reads the file at `relative` as UTF-8.
    pub async fn read_to_string(&self, relative: &str) -> Result<String, FileError> {
        let bytes = self.read(relative).await?;
        String::from_utf8(bytes).map_err(|e| FileError::Io {
            requested: relative.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidData, e.utf8_error()),
        })
    }

    /// Atomically writes `contents` to `relative`.
    ///
    /// The parent directory must already exist. An existing file is replaced
    /// and reported through [`WriteOutcome::replaced`].
    #[instrument(skip(self, contents))]
    pub async fn write(
        &self,
        relative: &str,
        contents: impl AsRef<[u8]>,
    ) -> Result<WriteOutcome, FileError> {
        let contents = contents.as_ref();
        let target = self.resolve(relative).await?;
        if target == self.root {
            return Err(FileError::NotAFile {
                requested: relative.to_string(),
            });
        }
        if let Ok(meta) = fs::metadata(&target).await
            && meta.is_dir()
        {
            return Err(FileError::NotAFile {
                requested: relative.to_string(),
            });
        }

        let (Some(parent), Some(name)) = (target.parent(), target.file_name()) else {
            return Err(FileError::NotAFile {
                requested: relative.to_string(),
            });
        };
        let staging = parent.join(format!(
            ".{}.{}{STAGING_SUFFIX}",
            staging_stem(&name.to_string_lossy()),
            Uuid::new_v4().simple()
        ));

        if let Err(e) = stage(&staging, contents).await {
            discard(&staging).await;
            return Err(FileError::from_io(relative, e));
        }

        let replaced = fs::symlink_metadata(&target).await.is_ok();
        if let Err(e) = fs::rename(&staging, &target).await {
            discard(&staging).await;
            return Err(FileError::from_io(relative, e));
        }

        debug!(bytes = contents.len(), replaced, "Wrote file");
        Ok(WriteOutcome {
            path: target,
            bytes_written: contents.len() as u64,
            replaced,
        })
    }

    /// Lists regular files directly under the root.
    pub async fn list(&self) -> Result<Vec<FileEntry>, FileError> {
        self.list_dir("").await
    }

    /// Lists regular files directly under `relative`.
    ///
    /// Symlinks are skipped without being followed, as are directories and
    /// in-flight staging files. Entries are sorted by name.
    #[instrument(skip(self))]
    pub async fn list_dir(&self, relative: &str) -> Result<Vec<FileEntry>, FileError> {
        let dir = self.resolve(relative).await?;
        let mut reader = fs::read_dir(&dir)
            .await
            .map_err(|e| FileError::from_io(relative, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FileError::from_io(relative, e))?
        {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_staging_name(&name) {
                continue;
            }
            // The file may vanish between read_dir and metadata.
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(error = %e, "Skipping entry with unreadable metadata");
                    continue;
                }
            };
            entries.push(FileEntry {
                name,
                size: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = entries.len(), "Listed directory");
        Ok(entries)
    }

    /// Removes the file at `relative`.
    #[instrument(skip(self))]
    pub async fn remove(&self, relative: &str) -> Result<(), FileError> {
        let path = self.resolve(relative).await?;
        ensure_regular_file(relative, &path).await?;
        fs::remove_file(&path)
            .await
            .map_err(|e| FileError::from_io(relative, e))?;
        debug!("Removed file");
        Ok(())
    }
}

async fn ensure_regular_file(relative: &str, path: &Path) -> Result<(), FileError> {
    let meta = fs::metadata(path)
        .await
        .map_err(|e| FileError::from_io(relative, e))?;
    if meta.is_file() {
        Ok(())
    } else {
        Err(FileError::NotAFile {
            requested: relative.to_string(),
        })
    }
}

/// Returns false if `rel` is absolute or its `..` segments climb above its start.
fn stays_below_root(rel: &Path) -> bool {
    let mut depth: usize = 0;
    for component in rel.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return false,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::Normal(_) => depth += 1,
        }
    }
    true
}

/// Folds `.` and `..` segments without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// True if `candidate` equals `root` or lies below it.
///
/// `Path::starts_with` compares whole components, so `/data-evil` is not
/// considered inside `/data`.
fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

/// Target name as embedded in a staging name, cut on a char boundary.
fn staging_stem(name: &str) -> &str {
    if name.len() <= STAGING_STEM_MAX {
        return name;
    }
    let mut end = STAGING_STEM_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

fn is_staging_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(STAGING_SUFFIX)
}

async fn stage(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!(error = %e, "Failed to remove staging file");
    }
}
