//! Size-based change detection over the watched directory tree.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use error_stack::Report;
use walkdir::WalkDir;

use super::error::ScanError;

/// A data file that is new or whose size differs from the last recorded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub size: u64,
    /// Size recorded before this pass, `None` for a newly observed file.
    pub previous: Option<u64>,
}

/// Result of one enumeration pass.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub changes: Vec<FileChange>,
    pub files_seen: usize,
    pub errors: Vec<ScanError>,
}

/// Tracks the last observed size of every recognized data file.
///
/// Entries are never removed: a file that disappears from disk keeps its
/// last recorded size, and therefore keeps counting towards the total.
#[derive(Debug)]
pub struct FileStateTracker {
    suffix: String,
    sizes: Mutex<HashMap<PathBuf, u64>>,
}

impl FileStateTracker {
    /// Creates a tracker recognizing files whose name ends with `extension`.
    /// The leading dot is optional (`fast5` and `.fast5` are equivalent).
    pub fn new(extension: &str) -> Self {
        let extension = extension.trim_start_matches('.');
        Self {
            suffix: format!(".{extension}"),
            sizes: Mutex::new(HashMap::new()),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&self.suffix))
    }

    /// Walks `root` recursively and records the size of every recognized file.
    ///
    /// Returns the files that are new or changed size since the previous call.
    /// Entries that cannot be read are reported in [`ScanOutcome::errors`] and
    /// skipped; they never abort the walk.
    pub fn scan(&self, root: &Path) -> ScanOutcome {
        let mut observed = Vec::new();
        let mut errors = Vec::new();

        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    tracing::warn!(path = %path.display(), error = %e, "failed to read directory entry");
                    errors.push(ScanError::Io {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => observed.push((entry.into_path(), metadata.len())),
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "failed to stat data file");
                    errors.push(ScanError::Io {
                        path: entry.into_path(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let files_seen = observed.len();
        let mut changes = Vec::new();
        let mut sizes = self.sizes.lock().expect("poisoned");
        for (path, size) in observed {
            match sizes.insert(path.clone(), size) {
                Some(previous) if previous == size => {}
                previous => changes.push(FileChange {
                    path,
                    size,
                    previous,
                }),
            }
        }

        ScanOutcome {
            changes,
            files_seen,
            errors,
        }
    }

    /// Restores the bookkeeping that `change` replaced, so the same change is
    /// reported again by the next [`scan`](Self::scan).
    ///
    /// Does nothing if the recorded size has moved on since `change` was made.
    pub fn revert(&self, change: &FileChange) {
        let mut sizes = self.sizes.lock().expect("poisoned");
        if sizes.get(&change.path) != Some(&change.size) {
            return;
        }
        match change.previous {
            Some(previous) => {
                sizes.insert(change.path.clone(), previous);
            }
            None => {
                sizes.remove(&change.path);
            }
        }
    }

    /// Sum of the last recorded sizes of all tracked files.
    pub fn total_size(&self) -> u64 {
        self.sizes.lock().expect("poisoned").values().sum()
    }

    pub fn len(&self) -> usize {
        self.sizes.lock().expect("poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Verifies that the watched root exists and is a readable directory.
///
/// # Errors
///
/// - [`ScanError::RootUnavailable`] if the root is missing, not a directory or
///   cannot be listed
pub fn check_root(root: &Path) -> Result<(), Report<ScanError>> {
    let unavailable = |message: String| ScanError::RootUnavailable {
        path: root.to_path_buf(),
        message,
    };

    let metadata = std::fs::metadata(root).map_err(|e| Report::new(unavailable(e.to_string())))?;
    if !metadata.is_dir() {
        return Err(Report::new(unavailable("not a directory".to_string())));
    }
    std::fs::read_dir(root).map_err(|e| Report::new(unavailable(e.to_string())))?;
    Ok(())
}
