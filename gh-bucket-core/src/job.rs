//! High-level pipeline: orchestrates list → archive → publish for every configured entity.
//!
//! A backup run walks through the stages `Init → Listing → Fetching → Publishing → Done`:
//!   - Validates the [`JobSettings`] into a [`JobConfig`] (parsing the entity spec)
//!   - Lists the public repositories of every entity, in order
//!   - Archives each repository and publishes the archive right away, one at a time
//!   - Publishes the aggregate index of all listed repositories
//!
//! # Failure policy
//! Strictly fail-fast. The first error of any stage ends the run and becomes the
//! [`JobOutcome`]; nothing is retried and nothing already published is rolled back.
//! A rerun republishes everything, which is safe because every put overwrites.
//!
//! # Concurrency
//! None. Entities, pages and repositories are handled one after the other to keep
//! bandwidth and memory use bounded and predictable.
//!
//! # Navigation
//! - Entry points: [`run_job`] (from raw settings) and [`execute`] (from a validated config)
//! - Outcome: [`JobOutcome`]

use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{JobConfig, JobSettings};
use crate::contract::{Archiver, ObjectStore, RepositoryDescriptor, RepositoryLister};
use crate::error::{JobError, Stage};
use crate::publish::{publish_archive, publish_index};

/// Terminal result of one run. A success carries neither a stage nor an error.
#[derive(Debug)]
pub struct JobOutcome {
    pub stage: Option<Stage>,
    pub error: Option<JobError>,
}

impl JobOutcome {
    pub fn success() -> Self {
        Self {
            stage: None,
            error: None,
        }
    }

    pub fn failure(error: JobError) -> Self {
        Self {
            stage: Some(error.stage()),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Empty on success, otherwise e.g. `"Listing Error"`.
    pub fn stage_label(&self) -> &'static str {
        self.stage.map(|s| s.label()).unwrap_or("")
    }
}

impl From<Result<(), JobError>> for JobOutcome {
    fn from(result: Result<(), JobError>) -> Self {
        match result {
            Ok(()) => JobOutcome::success(),
            Err(e) => JobOutcome::failure(e),
        }
    }
}

/// Validates `settings` and runs the backup.
pub async fn run_job<L, A, S>(
    settings: &JobSettings,
    lister: &L,
    archiver: &A,
    store: &S,
) -> JobOutcome
where
    L: RepositoryLister + ?Sized,
    A: Archiver + ?Sized,
    S: ObjectStore + ?Sized,
{
    match JobConfig::from_settings(settings) {
        Ok(config) => execute(&config, lister, archiver, store).await,
        Err(e) => {
            error!(error = %e, "[BACKUP][ERROR] Invalid job configuration");
            JobOutcome::failure(e.into())
        }
    }
}

/// Runs the backup for an already validated configuration.
pub async fn execute<L, A, S>(config: &JobConfig, lister: &L, archiver: &A, store: &S) -> JobOutcome
where
    L: RepositoryLister + ?Sized,
    A: Archiver + ?Sized,
    S: ObjectStore + ?Sized,
{
    let run_id = Uuid::new_v4();
    let span = info_span!("backup", %run_id, bucket = %config.bucket_name);
    let outcome: JobOutcome = backup(config, lister, archiver, store)
        .instrument(span.clone())
        .await
        .into();

    span.in_scope(|| match &outcome.error {
        None => info!("[BACKUP] Job completed successfully"),
        Some(e) => error!(stage = outcome.stage_label(), error = %e, "[BACKUP][ERROR] Job failed"),
    });
    outcome
}

async fn backup<L, A, S>(
    config: &JobConfig,
    lister: &L,
    archiver: &A,
    store: &S,
) -> Result<(), JobError>
where
    L: RepositoryLister + ?Sized,
    A: Archiver + ?Sized,
    S: ObjectStore + ?Sized,
{
    config.trace_loaded();

    let repos = list_all(config, lister).await?;

    for (idx, repo) in repos.iter().enumerate() {
        info!(
            repo = %repo.full_name,
            position = idx + 1,
            total = repos.len(),
            "[BACKUP] Fetching repository"
        );
        let archive = archiver.archive(&repo.clone_url).await.map_err(|e| {
            error!(repo = %repo.full_name, error = %e, "[BACKUP][ERROR] Fetching failed");
            e
        })?;
        publish_archive(store, &config.bucket_name, &repo.full_name, archive)
            .await
            .map_err(|e| {
                error!(repo = %repo.full_name, error = %e, "[BACKUP][ERROR] Pushing archive failed");
                e
            })?;
    }

    publish_index(store, &config.bucket_name, &repos).await?;
    Ok(())
}

async fn list_all<L>(config: &JobConfig, lister: &L) -> Result<Vec<RepositoryDescriptor>, JobError>
where
    L: RepositoryLister + ?Sized,
{
    let mut repos = Vec::new();
    for entity in &config.entities {
        if !entity.kind.is_recognized() {
            warn!(entity = %entity.name, kind = ?entity.kind, "[BACKUP] Skipping entity of unrecognized type");
            continue;
        }
        let listed = lister
            .list_repositories(&entity.name, &entity.kind)
            .await
            .map_err(|e| {
                error!(entity = %entity.name, error = %e, "[BACKUP][ERROR] Listing failed");
                e
            })?;
        info!(entity = %entity.name, count = listed.len(), "[BACKUP] Listed entity");
        repos.extend(listed);
    }
    info!(total = repos.len(), "[BACKUP] Listing complete");
    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;

    #[test]
    fn success_has_empty_label() {
        let outcome = JobOutcome::success();
        assert!(outcome.is_success());
        assert_eq!(outcome.stage_label(), "");
    }

    #[test]
    fn failure_is_labelled_by_stage() {
        let outcome = JobOutcome::failure(ConfigurationError::EmptyEntities.into());
        assert!(!outcome.is_success());
        assert_eq!(outcome.stage_label(), "Initialization Error");
    }
}
