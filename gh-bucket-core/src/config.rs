use crate::entity::{parse_entities, EntitySpec};
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const BUCKET_NAME_ENV: &str = "GBAAS_COREBUCKET_NAME";
pub const BUCKET_REGION_ENV: &str = "GBAAS_COREBUCKET_REGION";
pub const ENTITIES_ENV: &str = "GBAAS_ENTITIES";

/// Raw job settings as handed over by the process bootstrapper.
///
/// Every field is optional here; [`JobConfig::from_settings`] decides what is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSettings {
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub bucket_region: Option<String>,
    #[serde(default)]
    pub entities: Option<String>,
}

/// Validated, immutable input of one backup run.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub bucket_name: String,
    pub bucket_region: String,
    pub entities: Vec<EntitySpec>,
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigurationError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v.to_owned()),
        _ => Err(ConfigurationError::Missing(name)),
    }
}

impl JobConfig {
    pub fn from_settings(settings: &JobSettings) -> Result<Self, ConfigurationError> {
        let bucket_name = required(&settings.bucket_name, BUCKET_NAME_ENV)?;
        let bucket_region = required(&settings.bucket_region, BUCKET_REGION_ENV)?;
        let entities = parse_entities(&required(&settings.entities, ENTITIES_ENV)?)?;
        Ok(JobConfig {
            bucket_name,
            bucket_region,
            entities,
        })
    }

    pub fn trace_loaded(&self) {
        info!(
            bucket = %self.bucket_name,
            region = %self.bucket_region,
            entities_count = self.entities.len(),
            "Loaded JobConfig"
        );
        debug!(?self, "JobConfig loaded (full debug)");
    }
}
