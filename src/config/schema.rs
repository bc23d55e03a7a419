use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Root config structure for .skillgridrc.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Backend root; endpoints live under `{baseUrl}/reportanalytics/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout in seconds. Default: 30
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Where exported workbooks are written. Default: current directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,

    /// Second location tried when saving to `outputDir` fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_dir: Option<String>,

    /// Units selected when none are given on the command line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<String>,
}

/// Values taken from command-line flags
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub timeout: Duration,
    pub output_dir: PathBuf,
    pub fallback_dir: PathBuf,
    pub units: Vec<String>,
}

impl Config {
    /// Apply the base URL from the environment. Environment beats file.
    pub fn merge_with_env(mut self, env_base_url: Option<String>) -> Self {
        if let Some(url) = env_base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = Some(url);
        }
        self
    }

    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(mut self, cli: &CliOverrides) -> Self {
        if cli.base_url.is_some() {
            self.base_url = cli.base_url.clone();
        }
        if cli.timeout_secs.is_some() {
            self.timeout_secs = cli.timeout_secs;
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = Some(dir.to_string_lossy().into_owned());
        }
        self
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        if self.extends.is_none() {
            self.extends = base.extends;
        }
        if self.base_url.is_none() {
            self.base_url = base.base_url;
        }
        if self.timeout_secs.is_none() {
            self.timeout_secs = base.timeout_secs;
        }
        if self.output_dir.is_none() {
            self.output_dir = base.output_dir;
        }
        if self.fallback_dir.is_none() {
            self.fallback_dir = base.fallback_dir;
        }
        if self.units.is_empty() {
            self.units = base.units;
        }
    }

    /// Fill in defaults
    pub fn settings(&self) -> Settings {
        Settings {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            output_dir: PathBuf::from(self.output_dir.as_deref().unwrap_or(".")),
            fallback_dir: PathBuf::from(self.fallback_dir.as_deref().unwrap_or(".")),
            units: self.units.clone(),
        }
    }
}
