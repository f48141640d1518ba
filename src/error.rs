use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Root directory does not exist: {path}")]
    RootNotFound { path: String },

    #[error("Path is not a directory: {path}")]
    RootNotADirectory { path: String },

    #[error("Directory scan failed: {message}")]
    Scan { message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("No groups found in TDMS file")]
    NoGroups,

    #[error("Invalid TDMS file: {message}")]
    InvalidFormat { message: String },

    #[error("Unsupported TDMS feature: {feature}")]
    Unsupported { feature: String },

    #[error("Output collision: group '{group}' maps to already-written {path}")]
    OutputCollision { group: String, path: String },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for BatchError {
    fn user_message(&self) -> String {
        match self {
            BatchError::RootNotFound { path } => {
                format!("Directory does not exist: {}", path)
            }
            BatchError::RootNotADirectory { path } => {
                format!("Path is not a directory: {}", path)
            }
            BatchError::Scan { message } => {
                format!("Directory scan failed: {}", message)
            }
            BatchError::NoGroups => "No groups found in TDMS file".to_string(),
            BatchError::InvalidFormat { message } => {
                format!("Invalid TDMS file: {}", message)
            }
            BatchError::Unsupported { feature } => {
                format!("Unsupported TDMS feature: {}", feature)
            }
            BatchError::OutputCollision { group, path } => {
                format!(
                    "Group '{}' maps to an output file already written by another group: {}",
                    group, path
                )
            }
            BatchError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            BatchError::RootNotFound { .. } => Some(
                "Check the path for typos. The root directory must exist before conversion."
                    .to_string(),
            ),
            BatchError::RootNotADirectory { .. } => Some(
                "Pass the directory containing your TDMS files, not a file path.".to_string(),
            ),
            BatchError::Scan { .. } => Some(
                "Ensure you have read permission for the root directory and all subdirectories."
                    .to_string(),
            ),
            BatchError::NoGroups => Some(
                "The file parsed correctly but declares no data groups. It may contain only \
                 file-level properties."
                    .to_string(),
            ),
            BatchError::Unsupported { .. } => Some(
                "Only little-endian, non-interleaved segments with standard raw data indexes \
                 are supported. Re-export the file without DAQmx or interleaved layout."
                    .to_string(),
            ),
            BatchError::OutputCollision { .. } => Some(
                "Rename one of the conflicting groups, or convert the file in a directory of \
                 its own and rename the outputs afterwards."
                    .to_string(),
            ),
            BatchError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for BatchError {
    fn from(error: toml::de::Error) -> Self {
        BatchError::Config {
            message: error.to_string(),
        }
    }
}

impl From<regex::Error> for BatchError {
    fn from(error: regex::Error) -> Self {
        BatchError::Config {
            message: format!("invalid exclude pattern: {}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
