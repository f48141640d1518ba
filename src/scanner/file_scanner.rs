use crate::config::ScanConfig;
use crate::error::{BatchError, Result};
use crate::scanner::file_filter::FileFilter;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

/// A discovered measurement file. Immutable once discovered; consumed once
/// by conversion.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub filename: String,
    pub size: u64,
    pub modified: SystemTime,
}

impl SourceFile {
    pub fn new(path: PathBuf, relative_path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        Self {
            path,
            relative_path,
            filename,
            size,
            modified,
        }
    }

    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }
}

pub struct FileScanner {
    filter: FileFilter,
    max_depth: usize,
}

impl FileScanner {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        Ok(Self {
            filter: FileFilter::new(config)?,
            max_depth: config.max_depth,
        })
    }

    /// Recursively collect every file under `root` whose name carries the
    /// configured extension.
    ///
    /// Traversal errors (unreadable subdirectories, permission denied) are
    /// fatal and propagate; they are never silently skipped. Symlinks are
    /// not followed. Results are sorted by path so batch output is stable.
    pub fn scan<P: AsRef<Path>>(&self, root: P) -> Result<Vec<SourceFile>> {
        let root_path = root.as_ref();

        if !root_path.exists() {
            return Err(BatchError::RootNotFound {
                path: root_path.display().to_string(),
            });
        }

        if !root_path.is_dir() {
            return Err(BatchError::RootNotADirectory {
                path: root_path.display().to_string(),
            });
        }

        let mut walker = WalkDir::new(root_path).follow_links(false);
        if self.max_depth > 0 {
            walker = walker.max_depth(self.max_depth);
        }

        let mut sources = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| self.should_traverse(e))
        {
            let entry = entry.map_err(|err| BatchError::Scan {
                message: err.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            if !self.filter.is_source_file(entry.path()) {
                continue;
            }

            let metadata = entry.metadata().map_err(|err| BatchError::Scan {
                message: format!("{}: {}", entry.path().display(), err),
            })?;

            let relative_path = entry
                .path()
                .strip_prefix(root_path)
                .unwrap_or(entry.path())
                .to_path_buf();

            sources.push(SourceFile::new(
                entry.path().to_path_buf(),
                relative_path,
                metadata.len(),
                metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            ));
        }

        sources.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(sources)
    }

    fn should_traverse(&self, entry: &DirEntry) -> bool {
        // The root itself is always entered; exclusions apply below it.
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }

        self.filter.should_traverse_directory(entry.path())
    }

    pub fn extension(&self) -> &str {
        self.filter.extension()
    }
}
