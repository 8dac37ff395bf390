//! # contract: the seams of the backup pipeline
//!
//! Every external effect of a backup run sits behind one of the traits below, so the
//! orchestrator in [`crate::job`] can be driven by real clients in production and by
//! `mockall` mocks in tests.
//!
//! - [`RepositoryLister`]: enumerates the public repositories of one entity.
//! - [`PageFetcher`]: performs one HTTP GET of one listing page.
//! - [`Archiver`]: clones one repository and returns a zip of it.
//! - [`ObjectStore`]: overwrite-puts one blob under a key in a bucket.
//!
//! All traits are async (`async_trait`) and `Send + Sync`. Mocks are generated for
//! tests and exported behind the `test-export-mocks` feature for dependent crates.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::error::{FetchError, ListingError, PublishError};

/// The subset of GitHub's repository metadata that is kept for the backup index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// `owner/repo`; also the archive key.
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub clone_url: String,
    pub language: Option<String>,
    #[serde(rename = "fork")]
    pub is_fork: bool,
}

/// Raw response of a single listing page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Lists every public repository of one entity.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryLister: Send + Sync {
    async fn list_repositories(
        &self,
        name: &str,
        kind: &EntityKind,
    ) -> Result<Vec<RepositoryDescriptor>, ListingError>;
}

/// Transport for a single page request. Errors are transport-level only: a non-200
/// status is a successful fetch with that status.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, ListingError>;
}

/// Produces a compressed snapshot of a repository, history included.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, clone_url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Durable object storage. A put always overwrites whatever is stored under the key.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>)
        -> Result<(), PublishError>;
}
