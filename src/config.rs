use crate::error::{BatchError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub scan: ScanConfig,
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// File extension to match, case-sensitive, without the leading dot.
    pub extension: String,
    pub exclude_dirs: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Maximum traversal depth; 0 means unlimited.
    pub max_depth: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConvertConfig {
    /// Number of write segments per output file. Memory/performance knob:
    /// any value >= 1 produces identical output.
    pub chunk_count: usize,
    pub output_format: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "tdms".to_string(),
            exclude_dirs: vec![".git".to_string()],
            exclude_patterns: vec![],
            max_depth: 0,
        }
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            chunk_count: 101,
            output_format: "csv".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BatchError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| BatchError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| BatchError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["tdms2csv.toml", ".tdms2csv.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref extension) = cli_args.extension {
            self.scan.extension = extension.trim_start_matches('.').to_string();
        }

        if let Some(ref exclude) = cli_args.exclude {
            self.scan.exclude_dirs.extend(exclude.clone());
        }

        if let Some(max_depth) = cli_args.max_depth {
            self.scan.max_depth = max_depth;
        }

        if let Some(chunk_count) = cli_args.chunk_count {
            self.convert.chunk_count = chunk_count;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| BatchError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| BatchError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.extension.is_empty() {
            return Err(BatchError::Config {
                message: "File extension must not be empty".to_string(),
            });
        }

        if self.convert.chunk_count == 0 {
            return Err(BatchError::Config {
                message: "Chunk count must be at least 1".to_string(),
            });
        }

        if self.convert.output_format.is_empty() {
            return Err(BatchError::Config {
                message: "Output format must not be empty".to_string(),
            });
        }

        for pattern in &self.scan.exclude_patterns {
            regex::Regex::new(pattern).map_err(|e| BatchError::Config {
                message: format!("Invalid exclude pattern '{}': {}", pattern, e),
            })?;
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub extension: Option<String>,
    pub exclude: Option<Vec<String>>,
    pub max_depth: Option<usize>,
    pub chunk_count: Option<usize>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension;
        self
    }

    pub fn with_exclude(mut self, exclude: Option<Vec<String>>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_chunk_count(mut self, chunk_count: Option<usize>) -> Self {
        self.chunk_count = chunk_count;
        self
    }
}
