//! Configuration management for the validator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (treeform.toml)
//! - Environment variables (TREEFORM_*)
//!
//! ## Example config file (treeform.toml):
//! ```toml
//! [formats]
//! schema_dir = "./schemas"
//! format_name = "album"
//! default_version = "2"
//!
//! [verify]
//! check_extension = true
//! analyze_schema = true
//!
//! [report]
//! output_format = "pretty"
//! min_severity = "warning"
//! include_traces = false
//! include_checksum = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::diagnostics::Severity;

/// Main configuration for the validator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Schema lookup settings
    #[serde(default)]
    pub formats: FormatsConfig,

    /// Verification settings
    #[serde(default)]
    pub verify: VerifyConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Schema lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatsConfig {
    /// Directory searched for schema files when none is given explicitly
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// Format name used when loading the schema directory as a registry
    #[serde(default = "default_format_name")]
    pub format_name: String,

    /// Version verified against when none is named explicitly
    /// (None picks the latest registered version)
    #[serde(default)]
    pub default_version: Option<String>,
}

/// Verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Whether a filename extension mismatch fails the check
    #[serde(default = "default_true")]
    pub check_extension: bool,

    /// Whether to analyze the schema for defects before verifying files
    #[serde(default = "default_true")]
    pub analyze_schema: bool,
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format for JSON reports
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Lowest severity printed in human-readable output
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,

    /// Include trace-level items in JSON reports
    #[serde(default)]
    pub include_traces: bool,

    /// Pin the schema file checksum in JSON reports
    #[serde(default = "default_true")]
    pub include_checksum: bool,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_schema_dir() -> PathBuf {
    PathBuf::from("./schemas")
}

fn default_format_name() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

fn default_min_severity() -> Severity {
    Severity::Warning
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            format_name: default_format_name(),
            default_version: None,
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            check_extension: true,
            analyze_schema: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Pretty,
            min_severity: Severity::Warning,
            include_traces: false,
            include_checksum: true,
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            formats: FormatsConfig::default(),
            verify: VerifyConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["treeform.toml", ".treeform.toml", "config/treeform.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("rs", "treeform", "treeform") {
            let xdg_config = config_dir.config_dir().join("treeform.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (TREEFORM_*)
        builder = builder.add_source(
            Environment::with_prefix("TREEFORM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the schema directory (resolves relative paths)
    pub fn schema_dir(&self) -> PathBuf {
        if self.formats.schema_dir.is_absolute() {
            self.formats.schema_dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.formats.schema_dir)
        }
    }
}
