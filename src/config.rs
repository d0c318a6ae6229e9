use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dashboard::SummaryJobs;

const CANDIDATES: [&str; 4] = [
    "ciradiator.toml",
    "ciradiator.json",
    "ciradiator.yaml",
    "ciradiator.yml",
];

/// Configuration file structure for ciradiator.
///
/// Every section is optional. Command line flags and environment variables
/// take precedence over file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub concourse: ConcourseConfig,

    #[serde(default)]
    pub jenkins: JenkinsConfig,

    /// Summary jobs and failure announcements
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConcourseConfig {
    /// Concourse web URL, e.g. `https://ci.example.com`
    pub base_url: Option<String>,

    #[serde(default = "default_team")]
    pub team: String,

    /// Bearer token, used as-is when set
    pub token: Option<String>,

    /// Local user exchanged for a bearer token at startup
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    pub base_url: Option<String>,

    /// View whose jobs make up the dashboard
    #[serde(default = "default_view")]
    pub view: String,

    pub username: Option<String>,

    /// API token for `username`
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DashboardConfig {
    #[serde(default = "default_health_check_job")]
    pub health_check_job: String,

    #[serde(default = "default_deploy_job")]
    pub deploy_job: String,

    /// Minimum seconds between two announcements of the same failing job
    #[serde(default = "default_notify_interval_secs")]
    pub notify_interval_secs: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Persist build history between runs
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ConcourseConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            team: default_team(),
            token: None,
            username: None,
            password: None,
        }
    }
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            view: default_view(),
            username: None,
            token: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            health_check_job: default_health_check_job(),
            deploy_job: default_deploy_job(),
            notify_interval_secs: default_notify_interval_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl DashboardConfig {
    pub fn summary_jobs(&self) -> SummaryJobs {
        SummaryJobs {
            health_check_job: self.health_check_job.clone(),
            deploy_job: self.deploy_job.clone(),
        }
    }
}

fn default_team() -> String {
    "main".to_string()
}

fn default_view() -> String {
    "All CD Pipelines".to_string()
}

fn default_health_check_job() -> String {
    SummaryJobs::default().health_check_job
}

fn default_deploy_job() -> String {
    SummaryJobs::default().deploy_job
}

fn default_notify_interval_secs() -> i64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Uses `path` when given, otherwise the first existing of
    /// `ciradiator.toml`, `ciradiator.json`, `ciradiator.yaml` and
    /// `ciradiator.yml` in the current directory.
    ///
    /// Returns default configuration if no file is found.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit path cannot be read, or if the file found
    /// does not parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::discover(Path::new(".")),
        }
    }

    fn discover(dir: &Path) -> Result<Self> {
        for candidate in CANDIDATES {
            let path = dir.join(candidate);
            if path.exists() {
                debug!("Using config file: {}", path.display());
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }
}
