//! Error taxonomy for a backup run.
//!
//! Every stage of the pipeline has its own error type. [`JobError`] unifies them and
//! knows which [`Stage`] a failure belongs to, which is what ends up in the
//! [`crate::job::JobOutcome`] label.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Missing or malformed input. Fatal, never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("required setting {0} not specified")]
    Missing(&'static str),
    #[error("entity spec is empty")]
    EmptyEntities,
    #[error("failed to parse entity {entry:?}: expected NAME:TYPE entries separated by ';'")]
    MalformedEntity { entry: String },
    #[error("github token contains characters not allowed in a header")]
    InvalidToken,
    #[error("could not build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Remote enumeration failed for an entity.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not decode repository page from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Cloning or archiving one repository failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),
    #[error("failed to launch git: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("git clone of {url} exited with {status}")]
    Clone { url: String, status: String },
    #[error("git clone of {url} did not finish within {timeout:?}")]
    CloneTimeout { url: String, timeout: Duration },
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Writing an object to the store failed.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("could not encode repository index: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("put of {bucket}/{key} failed: {message}")]
    Store {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("put of {bucket}/{key} did not finish within {timeout:?}")]
    Timeout {
        bucket: String,
        key: String,
        timeout: Duration,
    },
}

/// The stage a job failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initialization,
    Listing,
    Fetching,
    Pushing,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Initialization => "Initialization Error",
            Stage::Listing => "Listing Error",
            Stage::Fetching => "Fetching Error",
            Stage::Pushing => "Pushing Error",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl JobError {
    pub fn stage(&self) -> Stage {
        match self {
            JobError::Configuration(_) => Stage::Initialization,
            JobError::Listing(_) => Stage::Listing,
            JobError::Fetch(_) => Stage::Fetching,
            JobError::Publish(_) => Stage::Pushing,
        }
    }
}
