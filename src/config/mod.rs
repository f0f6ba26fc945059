use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const DEFAULT_DATAFLOW_URL: &str = "https://spatial.virtualearth.net/REST/v1/Dataflows/Geocode";

fn default_verbose() -> bool {
    false
}

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    /// Bing Maps key, forwarded untouched to the dataflow API
    #[serde(default)]
    pub key: Option<String>,
    /// File with one address per line
    #[serde(default)]
    pub input: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub dataflow: Option<DataflowConfig>,
}

fn default_dataflow_url() -> String {
    DEFAULT_DATAFLOW_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataflowConfig {
    #[serde(default = "default_dataflow_url")]
    pub url: String,
    /// Delay between job status checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Give up on a job that has not completed after this long
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Per HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DataflowConfig {
    fn default() -> Self {
        Self {
            url: default_dataflow_url(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl FileConfig {
    /// First parsable config file from the standard search paths
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }

    /// Load an explicitly requested config file, which must exist
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Config file not found: {:?}", path);
        }
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("geobatch.toml"));
    paths.push(PathBuf::from(".geobatch.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("geobatch").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".geobatch.toml"));
    }

    paths
}
