//! Object store key layout and the two publish operations built on [`ObjectStore`].

use tracing::info;

use crate::contract::{ObjectStore, RepositoryDescriptor};
use crate::error::PublishError;

pub const REPO_PREFIX: &str = "repos";
pub const INDEX_KEY: &str = "web/repos.json";

/// `repos/{owner}/{repo}.git.zip`
pub fn archive_key(full_name: &str) -> String {
    format!("{REPO_PREFIX}/{full_name}.git.zip")
}

pub async fn publish_archive<S>(
    store: &S,
    bucket: &str,
    full_name: &str,
    archive: Vec<u8>,
) -> Result<(), PublishError>
where
    S: ObjectStore + ?Sized,
{
    let key = archive_key(full_name);
    let size = archive.len();
    store.put_object(bucket, &key, archive).await?;
    info!(bucket, key = %key, size, "Published repository archive");
    Ok(())
}

/// Overwrites the index with the full list of repositories.
pub async fn publish_index<S>(
    store: &S,
    bucket: &str,
    repos: &[RepositoryDescriptor],
) -> Result<(), PublishError>
where
    S: ObjectStore + ?Sized,
{
    let body = serde_json::to_vec(repos)?;
    store.put_object(bucket, INDEX_KEY, body).await?;
    info!(bucket, key = INDEX_KEY, count = repos.len(), "Published repository index");
    Ok(())
}

#[cfg(any(test, feature = "test-export-mocks"))]
pub use memory::InMemoryStore;

#[cfg(any(test, feature = "test-export-mocks"))]
mod memory {
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::{Mutex, PoisonError};

    use crate::contract::ObjectStore;
    use crate::error::PublishError;

    /// An [`ObjectStore`] kept in memory, keyed by `(bucket, key)`.
    #[derive(Debug, Default)]
    pub struct InMemoryStore {
        objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    }

    impl InMemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&(bucket.to_owned(), key.to_owned()))
                .cloned()
        }

        /// All keys stored in `bucket`, sorted.
        pub fn keys(&self, bucket: &str) -> Vec<String> {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .keys()
                .filter(|(b, _)| b == bucket)
                .map(|(_, k)| k.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ObjectStore for InMemoryStore {
        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            body: Vec<u8>,
        ) -> Result<(), PublishError> {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert((bucket.to_owned(), key.to_owned()), body);
            Ok(())
        }
    }
}
