use crate::config::ScanConfig;
use crate::error::Result;
use regex::Regex;
use std::path::Path;

pub struct FileFilter {
    extension: String,
    exclude_dirs: Vec<String>,
    exclude_patterns: Vec<Regex>,
}

impl FileFilter {
    /// Fails on an invalid exclude pattern; a silently dropped pattern
    /// would scan directories the user asked to skip.
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            extension: config.extension.clone(),
            exclude_dirs: config.exclude_dirs.clone(),
            exclude_patterns,
        })
    }

    /// Case-sensitive exact suffix match on the configured extension.
    /// `x.TDMS` does not match extension `tdms`.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == self.extension)
    }

    pub fn should_traverse_directory(&self, path: &Path) -> bool {
        if let Some(dir_name) = path.file_name().and_then(|s| s.to_str()) {
            if self.exclude_dirs.iter().any(|exclude| exclude == dir_name) {
                return false;
            }

            let path_str = path.to_string_lossy();
            for pattern in &self.exclude_patterns {
                if pattern.is_match(&path_str) {
                    return false;
                }
            }
        }

        true
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}
