use crate::config::ConvertConfig;
use crate::convert::csv_writer::write_table_chunked;
use crate::error::{BatchError, Result, UserFriendlyError};
use crate::tdms::{GroupTable, TdmsFile};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Outcome of converting one source file. A failed conversion may still
/// carry outputs: files fully written before the failure are kept, never
/// rolled back.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub skipped_groups: Vec<String>,
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Derive the output path for one group: same directory as the source,
/// named `<stem>_<group>.<format>`.
pub fn output_path(source: &Path, group_name: &str, format: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let filename = format!("{}_{}.{}", stem, sanitize_group_name(group_name), format);

    match source.parent() {
        Some(parent) => parent.join(filename),
        None => PathBuf::from(filename),
    }
}

/// Replace path separators and characters some filesystems reject so a
/// group name can be embedded in a filename.
pub fn sanitize_group_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());

    for ch in name.chars() {
        match ch {
            '/' | '\\' => sanitized.push('_'),
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => sanitized.push('_'),
            c if c.is_control() => sanitized.push('_'),
            c => sanitized.push(c),
        }
    }

    let sanitized = sanitized.trim_end_matches(['.', ' ']).to_string();

    if sanitized.is_empty() {
        "unnamed_group".to_string()
    } else {
        sanitized
    }
}

pub struct FileConverter {
    chunk_count: usize,
    output_format: String,
}

impl FileConverter {
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            chunk_count: config.chunk_count.max(1),
            output_format: config.output_format.clone(),
        }
    }

    /// Convert one source file, writing one output per non-empty group.
    ///
    /// Groups are processed in container order. Empty groups are skipped
    /// and recorded. The first error aborts the file; the result keeps the
    /// outputs written up to that point.
    pub fn convert(&self, source: &Path) -> ConversionResult {
        let mut outputs = Vec::new();
        let mut skipped_groups = Vec::new();

        match self.convert_inner(source, &mut outputs, &mut skipped_groups) {
            Ok(()) => ConversionResult {
                source: source.to_path_buf(),
                outputs,
                skipped_groups,
                error: None,
            },
            Err(e) => ConversionResult {
                source: source.to_path_buf(),
                outputs,
                skipped_groups,
                error: Some(e.user_message()),
            },
        }
    }

    fn convert_inner(
        &self,
        source: &Path,
        outputs: &mut Vec<PathBuf>,
        skipped_groups: &mut Vec<String>,
    ) -> Result<()> {
        let file = TdmsFile::open(source)?;

        if file.group_count() == 0 {
            return Err(BatchError::NoGroups);
        }

        let mut written: HashSet<PathBuf> = HashSet::new();

        for table in file.groups() {
            if table.is_empty() {
                skipped_groups.push(table.name().to_string());
                continue;
            }

            let dest = output_path(source, table.name(), &self.output_format);

            // Two groups normalizing to the same filename would silently
            // clobber each other; fail the file instead.
            if !written.insert(dest.clone()) {
                return Err(BatchError::OutputCollision {
                    group: table.name().to_string(),
                    path: dest.display().to_string(),
                });
            }

            self.write_group(table, &dest)?;
            outputs.push(dest);
        }

        Ok(())
    }

    fn write_group(&self, table: &GroupTable, dest: &Path) -> Result<()> {
        write_table_chunked(table, dest, self.chunk_count)
    }
}
