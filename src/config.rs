//! `.learngap.toml` settings.
//!
//! File values are defaults; explicit command-line arguments win.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".learngap.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Spreadsheet loading settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Spreadsheet export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Abort the load-and-analyse step after this many seconds.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Spreadsheet loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Sheet to read; the first sheet when unset.
    #[serde(default)]
    pub sheet: Option<String>,

    /// Accepted file extensions.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Maximum input size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sheet: None,
            extensions: default_extensions(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["xlsx", "xls", "xlsm", "xlsb", "ods"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_size() -> u64 {
    16 * 1024 * 1024 // 16MB
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text reports (default)
    #[default]
    Text,
    /// JSON value tree wrapped in a success envelope
    Json,
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Only report the N lowest-accuracy students.
    #[serde(default)]
    pub top_n: Option<usize>,

    /// Output file; standard output when unset.
    #[serde(default)]
    pub output: Option<String>,
}

/// Spreadsheet export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Export path; no export when unset.
    #[serde(default)]
    pub path: Option<String>,

    /// File name used by `--export` without a value.
    #[serde(default = "default_export_name")]
    pub default_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_name: default_export_name(),
        }
    }
}

fn default_export_name() -> String {
    crate::report::DEFAULT_EXPORT_NAME.to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Overlay the values given explicitly on the command line.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref sheet) = args.sheet {
            self.loader.sheet = Some(sheet.clone());
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(top_n) = args.top_n {
            self.report.top_n = Some(top_n);
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.display().to_string());
        }

        // `--export` with no value falls back to the configured default name
        if let Some(ref export) = args.export {
            self.export.path = Some(
                export
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| self.export.default_name.clone()),
            );
        }

        if let Some(timeout) = args.timeout {
            self.general.timeout_seconds = Some(timeout);
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Default settings rendered as TOML, for `--init-config`.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
