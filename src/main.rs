use clap::Parser;
use std::path::PathBuf;
use std::process;
use tdms2csv::{
    BatchConverter, BatchError, Cli, OutputFormatter, OutputMode, UserFriendlyError,
};

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let converter = match BatchConverter::from_cli(&cli) {
        Ok(converter) => converter,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    // The clap rule guarantees root is present past this point.
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => {
            let e = BatchError::Config {
                message: "No root directory given".to_string(),
            };
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&converter, &root);
    }

    match converter.run(&root) {
        // A completed batch exits 0 even when some files failed; failures
        // are reported in the summary, not the exit code.
        Ok(_summary) => 0,
        Err(e) => {
            converter.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

/// One exit code per fatal error kind, applied at every exit point.
fn exit_code_for(error: &BatchError) -> i32 {
    match error {
        BatchError::RootNotFound { .. } | BatchError::RootNotADirectory { .. } => 2,
        BatchError::Scan { .. } => 3,
        BatchError::Config { .. } => 4,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "tdms2csv.toml".to_string());

    match BatchConverter::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  tdms2csv <root-directory> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            exit_code_for(&e)
        }
    }
}

fn handle_dry_run(converter: &BatchConverter, root: &PathBuf) -> i32 {
    let formatter = converter.output_formatter();

    formatter.info("DRY RUN MODE - No files will be converted");
    formatter.print_separator();

    let sources = match converter.scan_sources(root) {
        Ok(sources) => sources,
        Err(e) => {
            converter.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    let config = converter.config();
    formatter.info("Configuration that would be used:");
    println!("  Extension: .{}", config.scan.extension);
    println!("  Exclude directories: {}", config.scan.exclude_dirs.join(", "));
    println!("  Write segments per file: {}", config.convert.chunk_count);
    println!("  Output format: {}", config.convert.output_format);

    formatter.print_separator();

    if sources.is_empty() {
        formatter.info(&format!(
            "No .{} files found under {}",
            config.scan.extension,
            root.display()
        ));
    } else {
        formatter.info(&format!("Would convert {} file(s):", sources.len()));
        for source in &sources {
            println!("  {}", source.display_path());
        }
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform the conversion");

    0
}

fn print_startup_error(error: &BatchError) {
    // Config may not have loaded; use a bare formatter.
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn cli_for_generate(config: Option<PathBuf>) -> Cli {
        Cli {
            root: None,
            extension: None,
            chunks: None,
            exclude: None,
            max_depth: None,
            config,
            output_format: tdms2csv::cli::OutputFormat::Plain,
            verbose: 0,
            quiet: true,
            dry_run: false,
            generate_config: true,
        }
    }

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = cli_for_generate(Some(config_path.clone()));

        let exit_code = handle_generate_config(&cli);
        assert_eq!(exit_code, 0);
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[scan]"));
    }

    #[test]
    fn test_dry_run_lists_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        fs::write(root.join("data.tdms"), b"placeholder").unwrap();

        let converter = BatchConverter::new(
            tdms2csv::Config::default(),
            OutputMode::Plain,
            0,
            true,
        );

        let exit_code = handle_dry_run(&converter, &root);
        assert_eq!(exit_code, 0);
        // Nothing was converted, not even the placeholder.
        assert!(!root.join("data_Group.csv").exists());
    }

    #[test]
    fn test_dry_run_missing_root_exits_like_a_real_run() {
        let converter = BatchConverter::new(
            tdms2csv::Config::default(),
            OutputMode::Plain,
            0,
            true,
        );

        let exit_code = handle_dry_run(&converter, &PathBuf::from("/no/such/dir"));
        assert_eq!(exit_code, 2);
    }

    #[test]
    fn test_exit_codes_by_error_kind() {
        let root = BatchError::RootNotFound {
            path: "/x".to_string(),
        };
        let not_dir = BatchError::RootNotADirectory {
            path: "/x".to_string(),
        };
        let scan = BatchError::Scan {
            message: "denied".to_string(),
        };
        let config = BatchError::Config {
            message: "bad".to_string(),
        };
        let other = BatchError::NoGroups;

        assert_eq!(exit_code_for(&root), 2);
        assert_eq!(exit_code_for(&not_dir), 2);
        assert_eq!(exit_code_for(&scan), 3);
        assert_eq!(exit_code_for(&config), 4);
        assert_eq!(exit_code_for(&other), 1);
    }
}
