pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod scanner;
pub mod tdms;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ConvertConfig, ScanConfig};
pub use error::{BatchError, Result, UserFriendlyError};

// Core functionality re-exports
pub use convert::{BatchSummary, ConversionResult, FileConverter, Verdict};
pub use scanner::{FileFilter, FileScanner, SourceFile};
pub use tdms::{GroupTable, TdmsFile};
pub use ui::{OutputFormatter, OutputMode, ProgressAwareOutput, ProgressManager};

use std::path::Path;
use std::time::Instant;

/// Main library interface: scans a directory tree and converts every
/// matching file, isolating per-file failures so one broken file never
/// aborts the batch.
pub struct BatchConverter {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl BatchConverter {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let show_progress = !quiet && matches!(output_mode, OutputMode::Human);
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(show_progress);

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    /// Create a BatchConverter from parsed CLI arguments.
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(
            config,
            output_mode,
            cli_args.verbose,
            cli_args.quiet,
        ))
    }

    /// Run the full batch: scan, convert each file in order, report.
    ///
    /// Returns the summary; scan failures (missing root, unreadable tree)
    /// propagate as errors, individual conversion failures do not.
    pub fn run<P: AsRef<Path>>(&self, root: P) -> Result<BatchSummary> {
        let start_time = Instant::now();

        self.output_formatter
            .start_operation("Starting batch conversion");

        let sources = self.scan_sources(root.as_ref())?;

        if sources.is_empty() {
            self.output_formatter.info(&format!(
                "No .{} files found under {}",
                self.config.scan.extension,
                root.as_ref().display()
            ));
            let summary = BatchSummary::default();
            self.output_formatter.print_batch_summary(&summary);
            return Ok(summary);
        }

        self.output_formatter.info(&format!(
            "Found {} file(s) to convert",
            sources.len()
        ));

        let summary = self.convert_sources(&sources);

        self.output_formatter.debug(&format!(
            "Batch finished in {}",
            ui::format_duration(start_time.elapsed())
        ));
        self.output_formatter.print_batch_summary(&summary);

        Ok(summary)
    }

    /// Scan for source files, failing loudly on traversal errors.
    pub fn scan_sources(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let scanner = FileScanner::new(&self.config.scan)?;
        scanner.scan(root)
    }

    fn convert_sources(&self, sources: &[SourceFile]) -> BatchSummary {
        let converter = FileConverter::new(&self.config.convert);
        let progress_bar = self
            .progress_manager
            .create_file_progress(sources.len() as u64);
        let output = ProgressAwareOutput::new(&self.output_formatter, Some(&self.progress_manager));

        let mut summary = BatchSummary::default();

        for (i, source) in sources.iter().enumerate() {
            output.file_progress(i + 1, sources.len(), &source.display_path());
            progress_bar.set_message(source.filename.clone());

            let result = converter.convert(&source.path);
            self.report_result(&output, &result);

            summary.record(&result);
            progress_bar.inc(1);
        }

        ui::finish_progress_with_summary(
            &progress_bar,
            &format!("Converted {} of {} files", summary.converted, summary.total_files),
            progress_bar.elapsed(),
        );
        self.progress_manager.clear();

        summary
    }

    fn report_result(&self, output: &ProgressAwareOutput, result: &ConversionResult) {
        match &result.error {
            None => {
                output.success(&format!(
                    "{}: wrote {} file(s)",
                    result.source.display(),
                    result.outputs.len()
                ));
            }
            Some(message) => {
                output.error(&format!("{}: {}", result.source.display(), message));
            }
        }

        for group in &result.skipped_groups {
            output.warning(&format!(
                "{}: group '{}' has no data, skipped",
                result.source.display(),
                group
            ));
        }

        // Output paths are only listed at -v and above.
        if self.output_formatter.is_verbose() {
            for path in &result.outputs {
                output.info(&format!("  -> {}", path.display()));
            }
        }
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config).map_err(BatchError::Io)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &BatchError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn quiet_converter() -> BatchConverter {
        BatchConverter::new(Config::default(), OutputMode::Plain, 0, true)
    }

    // Minimal single-group, single-channel fixture.
    fn tdms_bytes(group: &str, values: &[f64]) -> Vec<u8> {
        let path = format!("/'{}'/'ch0'", group);
        let mut meta = 1u32.to_le_bytes().to_vec();
        meta.extend_from_slice(&(path.len() as u32).to_le_bytes());
        meta.extend_from_slice(path.as_bytes());
        meta.extend_from_slice(&20u32.to_le_bytes());
        meta.extend_from_slice(&0x0Au32.to_le_bytes());
        meta.extend_from_slice(&1u32.to_le_bytes());
        meta.extend_from_slice(&(values.len() as u64).to_le_bytes());
        meta.extend_from_slice(&0u32.to_le_bytes());

        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();

        let mut out = Vec::new();
        out.extend_from_slice(b"TDSm");
        out.extend_from_slice(&0b1110u32.to_le_bytes());
        out.extend_from_slice(&4713u32.to_le_bytes());
        out.extend_from_slice(&((meta.len() + raw.len()) as u64).to_le_bytes());
        out.extend_from_slice(&(meta.len() as u64).to_le_bytes());
        out.extend_from_slice(&meta);
        out.extend_from_slice(&raw);
        out
    }

    #[test]
    fn test_run_converts_and_isolates_failures() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("a/good.tdms"), tdms_bytes("Voltage", &[1.0, 2.0])).unwrap();
        fs::write(root.join("b/bad.tdms"), b"not a tdms file").unwrap();

        let summary = quiet_converter().run(root).unwrap();

        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.converted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.verdict(), Verdict::PartialSuccess);
        assert!(root.join("a/good_Voltage.csv").exists());
    }

    #[test]
    fn test_run_with_no_matching_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();

        let summary = quiet_converter().run(temp_dir.path()).unwrap();

        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.verdict(), Verdict::NothingToDo);
    }

    #[test]
    fn test_invalid_exclude_pattern_fails_the_scan() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.scan.exclude_patterns.push("[unclosed".to_string());

        let converter = BatchConverter::new(config, OutputMode::Plain, 0, true);
        let result = converter.run(temp_dir.path());

        assert!(matches!(result, Err(BatchError::Config { .. })));
    }

    #[test]
    fn test_run_missing_root_propagates() {
        let result = quiet_converter().run("/no/such/directory");
        assert!(matches!(result, Err(BatchError::RootNotFound { .. })));
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        BatchConverter::generate_sample_config(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[scan]"));
        assert!(content.contains("[convert]"));
    }
}
