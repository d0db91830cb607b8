use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for mnemo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MnemoConfig {
    pub repository: RepositoryConfig,
    pub scan: ScanConfig,
    pub logging: LoggingConfig,
}

/// Repository-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Path handed to repository classification (a directory or a single
    /// Markdown file)
    pub path: PathBuf,
    /// Open the repository without ever writing back
    #[serde(default)]
    pub read_only: bool,
}

/// Scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Whether to log per-scan statistics
    #[serde(default = "default_true")]
    pub show_scan_stats: bool,
    /// Ignore patterns (glob syntax)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter handed to the host's logger setup
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for MnemoConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryConfig {
                path: PathBuf::from("."),
                read_only: false,
            },
            scan: ScanConfig {
                show_scan_stats: true,
                ignore_patterns: vec!["**/.git/**".to_string()],
            },
            logging: LoggingConfig {
                level: default_level(),
            },
        }
    }
}

impl MnemoConfig {
    /// Load config from YAML content
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
