/// `load_config` module: Loads the optional YAML config file and fills the gaps from the environment.
///
/// This module is the only place where the process environment is read. Everything it
/// produces is handed to `gh-bucket-core` as plain, immutable structs.
///
/// # Responsibilities
/// - Parse the user-supplied YAML configuration file, if any
/// - Fill every setting the file leaves out from environment variables (`.env` included)
/// - Provide defaults for the optional GitHub, archive and upload settings
///
/// Required settings are not validated here: a missing bucket or entity spec is reported
/// by the job itself as an `Initialization Error`.
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use gh_bucket_core::archive::DEFAULT_CLONE_TIMEOUT;
use gh_bucket_core::config::{JobSettings, BUCKET_NAME_ENV, BUCKET_REGION_ENV, ENTITIES_ENV};
use gh_bucket_core::list::GITHUB_API_URL;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const GITHUB_API_URL_ENV: &str = "GBAAS_GITHUB_API_URL";
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const SCRATCH_DIR_ENV: &str = "GBAAS_SCRATCH_DIR";
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub job: JobSettings,
    #[serde(default)]
    pub github: GithubSection,
    #[serde(default)]
    pub archive: ArchiveSection,
    #[serde(default)]
    pub upload: UploadSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct GithubSection {
    pub api_url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArchiveSection {
    pub scratch_dir: Option<PathBuf>,
    pub clone_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadSection {
    pub timeout_secs: Option<u64>,
}

impl CliConfig {
    pub fn api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(GITHUB_API_URL)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.archive
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn clone_timeout(&self) -> Duration {
        self.archive
            .clone_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CLONE_TIMEOUT)
    }

    pub fn upload_timeout(&self) -> Duration {
        self.upload
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_UPLOAD_TIMEOUT)
    }
}

/// Loads the YAML config at `path` (if given) and fills missing settings from the environment.
/// Values from the file win over the environment.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => {
            info!("No config file given, reading settings from the environment");
            CliConfig::default()
        }
    };
    apply_env(&mut config);
    info!(
        bucket_set = config.job.bucket_name.is_some(),
        region_set = config.job.bucket_region.is_some(),
        entities_set = config.job.entities.is_some(),
        api_url = config.api_url(),
        token_set = config.github.token.is_some(),
        "Configuration loaded"
    );
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<CliConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path, e));
        }
    };

    match serde_yaml::from_str(&content) {
        Ok(config) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(config)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Empty variables count as unset, so `GITHUB_TOKEN=` in CI does not become a blank token.
fn apply_env(config: &mut CliConfig) {
    fn fill(slot: &mut Option<String>, name: &str) {
        if slot.is_none() {
            *slot = std::env::var(name).ok().filter(|v| !v.is_empty());
        }
    }

    fill(&mut config.job.bucket_name, BUCKET_NAME_ENV);
    fill(&mut config.job.bucket_region, BUCKET_REGION_ENV);
    fill(&mut config.job.entities, ENTITIES_ENV);
    fill(&mut config.github.api_url, GITHUB_API_URL_ENV);
    fill(&mut config.github.token, GITHUB_TOKEN_ENV);
    if config.archive.scratch_dir.is_none() {
        config.archive.scratch_dir = std::env::var_os(SCRATCH_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
    }
}
