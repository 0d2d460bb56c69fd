use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, UNIX_EPOCH};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ScanSettings;
use crate::db::Database;
use crate::error::{DirscanError, Result};
use crate::models::entry::NewEntry;
use crate::models::timestamp::to_iso8601;
use crate::scan::progress::{ProgressSink, ScanProgress};

/// Outcome of a completed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// ID of the entry for the scanned folder itself.
    pub root_id: i64,
    pub folder_count: u64,
    pub file_count: u64,
    /// Directories whose contents could not be listed.
    pub unreadable_dirs: u64,
    /// Entries left out by exclude patterns.
    pub excluded: u64,
    /// Symlinks and special files, which are never recorded.
    pub skipped_special: u64,
    /// Children whose names are not valid UTF-8, which are never recorded.
    pub skipped_non_utf8: u64,
    pub elapsed_ms: u64,
}

/// Sequential depth-first scanner that records every node in the store.
pub struct Scanner<'db> {
    db: &'db Database,
    exclude_patterns: Vec<String>,
}

impl<'db> Scanner<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self {
            db,
            exclude_patterns: Vec::new(),
        }
    }

    /// Create a scanner that honours the configured exclude patterns.
    pub fn with_settings(db: &'db Database, settings: &ScanSettings) -> Self {
        Self {
            db,
            exclude_patterns: settings.exclude_patterns.clone(),
        }
    }

    /// Replace the store's contents with the tree rooted at `root`.
    ///
    /// Subdirectories are visited before sibling files. A directory that
    /// cannot be listed keeps its own entry and the scan moves on; a node
    /// whose metadata cannot be read aborts the scan, leaving what was
    /// stored so far in place.
    pub fn scan(&self, root: &Path, sink: &mut dyn ProgressSink) -> Result<ScanSummary> {
        let started = Instant::now();
        let root = normalize_root(root)?;
        let excludes = build_excludes(&root, &self.exclude_patterns)?;

        let cleared = self.db.clear_all()?;
        info!(root = %root.display(), cleared, "scan started");

        let mut walk = Walk {
            db: self.db,
            excludes,
            sink,
            progress: ScanProgress::default(),
            summary: ScanSummary::default(),
        };
        let root_id = walk.visit(&root, None)?;

        let mut summary = walk.summary;
        summary.root_id = root_id;
        summary.folder_count = walk.progress.folder_count;
        summary.file_count = walk.progress.file_count;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            root = %root.display(),
            folders = summary.folder_count,
            files = summary.file_count,
            unreadable = summary.unreadable_dirs,
            elapsed_ms = summary.elapsed_ms,
            "scan finished"
        );
        Ok(summary)
    }
}

/// Mutable state of one traversal.
struct Walk<'a> {
    db: &'a Database,
    excludes: Gitignore,
    sink: &'a mut dyn ProgressSink,
    progress: ScanProgress,
    summary: ScanSummary,
}

impl Walk<'_> {
    /// Store `path`, report progress, then descend if it is a directory.
    fn visit(&mut self, path: &Path, parent_id: Option<i64>) -> Result<i64> {
        let metadata = fs::metadata(path).map_err(|source| DirscanError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        let id = self.db.insert_entry(&new_entry(path, parent_id, &metadata))?;

        if metadata.is_dir() {
            self.progress.folder_count += 1;
        } else {
            self.progress.file_count += 1;
        }
        self.sink.on_progress(self.progress);

        if metadata.is_dir() {
            match list_children(path) {
                Ok(children) => {
                    self.summary.skipped_special += children.special;
                    self.summary.skipped_non_utf8 += children.non_utf8;
                    for dir in children.directories {
                        if self.is_excluded(&dir, true) {
                            continue;
                        }
                        self.visit(&dir, Some(id))?;
                    }
                    for file in children.files {
                        if self.is_excluded(&file, false) {
                            continue;
                        }
                        self.visit(&file, Some(id))?;
                    }
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "could not read directory contents");
                    self.summary.unreadable_dirs += 1;
                }
            }
        }

        Ok(id)
    }

    fn is_excluded(&mut self, path: &Path, is_dir: bool) -> bool {
        if self.excludes.matched(path, is_dir).is_ignore() {
            debug!(path = %path.display(), "excluded");
            self.summary.excluded += 1;
            true
        } else {
            false
        }
    }
}

/// Children of one directory, split by type and sorted by name.
#[derive(Debug, Default)]
struct Children {
    directories: Vec<PathBuf>,
    files: Vec<PathBuf>,
    special: u64,
    non_utf8: u64,
}

/// List a directory. Any error while reading the listing fails the whole call.
fn list_children(dir: &Path) -> io::Result<Children> {
    let mut children = Children::default();
    for dirent in fs::read_dir(dir)? {
        let dirent = dirent?;
        if dirent.file_name().to_str().is_none() {
            warn!(path = %dirent.path().display(), "skipping entry with a non UTF-8 name");
            children.non_utf8 += 1;
            continue;
        }
        let file_type = dirent.file_type()?;
        if file_type.is_dir() {
            children.directories.push(dirent.path());
        } else if file_type.is_file() {
            children.files.push(dirent.path());
        } else {
            debug!(path = %dirent.path().display(), "skipping symlink or special file");
            children.special += 1;
        }
    }
    children.directories.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    children.files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(children)
}

fn new_entry(path: &Path, parent_id: Option<i64>, metadata: &Metadata) -> NewEntry {
    let name = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
        .into_owned();
    let path_str = path.to_string_lossy().into_owned();
    let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
    let created = metadata.created().unwrap_or(modified);

    if metadata.is_dir() {
        NewEntry::directory(
            name,
            path_str,
            parent_id,
            to_iso8601(created),
            to_iso8601(modified),
        )
    } else {
        NewEntry::file(
            name,
            path_str,
            parent_id,
            metadata.len(),
            to_iso8601(created),
            to_iso8601(modified),
        )
    }
}

/// Absolute form of the scan root without `.` components or a trailing
/// separator. Symlinks are left unresolved. The result must be valid UTF-8
/// so stored paths match what lookups are given.
fn normalize_root(root: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(root).map_err(|source| DirscanError::Stat {
        path: root.to_path_buf(),
        source,
    })?;
    let normalized: PathBuf = absolute.components().collect();
    if normalized.to_str().is_none() {
        return Err(DirscanError::Other(format!(
            "scan root is not valid UTF-8: {}",
            normalized.display()
        )));
    }
    Ok(normalized)
}

fn build_excludes(root: &Path, patterns: &[String]) -> Result<Gitignore> {
    if patterns.is_empty() {
        return Ok(Gitignore::empty());
    }
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| DirscanError::Exclude(format!("{pattern}: {e}")))?;
    }
    builder
        .build()
        .map_err(|e| DirscanError::Exclude(e.to_string()))
}
