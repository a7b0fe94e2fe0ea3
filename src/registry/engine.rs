// ABOUTME: Local Docker/Podman image store backend built on bollard.
// ABOUTME: Treats each repository component of local image references as a repository.

use super::detection::{EngineInfo, EngineType};
use super::error::BackendError;
use super::traits::sealed::Sealed;
use super::traits::{BatchOutcome, DeleteError, DeletionFailure, FetchError, ImageDeleter, Inventory};
use crate::retention::ImageRecord;
use crate::types::{Digest, RepositoryName};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::ImageSummary;
use bollard::query_parameters::{ListImagesOptions, RemoveImageOptions};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;

const NONE_REFERENCE: &str = "<none>";

/// Images of one repository, keyed by image ID, with that repository's tags.
type RepositoryIndex = BTreeMap<RepositoryName, Vec<(ImageRecord, Vec<String>)>>;

/// Registry view over a local engine's image store.
///
/// A "digest" here is the local image ID. Deleting from a repository removes
/// that repository's tags; an image only disappears once nothing references it.
pub struct EngineRegistry {
    client: Docker,
    engine_type: EngineType,
    index: Mutex<RepositoryIndex>,
}

fn map_remove_error(e: bollard::errors::Error) -> String {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => format!("ImageNotFound: {}", message),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => format!("ImageInUse: {}", message),
        _ => e.to_string(),
    }
}

/// Split `repo:tag` at the last colon that follows the last slash, so
/// registry ports (`host:5000/app:v1`) stay in the repository part.
fn split_reference(reference: &str) -> Option<(&str, &str)> {
    let name_start = reference.rfind('/').map(|i| i + 1).unwrap_or(0);
    let colon = reference[name_start..].rfind(':')? + name_start;
    Some((&reference[..colon], &reference[colon + 1..]))
}

/// Group local images by repository.
fn build_index(summaries: Vec<ImageSummary>) -> RepositoryIndex {
    let mut index: RepositoryIndex = BTreeMap::new();

    for summary in summaries {
        let Ok(digest) = Digest::new(&summary.id) else {
            continue;
        };
        let pushed_at: Option<DateTime<Utc>> = DateTime::from_timestamp(summary.created, 0);

        let mut tags_by_repo: BTreeMap<RepositoryName, Vec<String>> = BTreeMap::new();
        for reference in &summary.repo_tags {
            let Some((repo, tag)) = split_reference(reference) else {
                continue;
            };
            if repo == NONE_REFERENCE || tag == NONE_REFERENCE {
                continue;
            }
            match RepositoryName::new(repo) {
                Ok(name) => tags_by_repo.entry(name).or_default().push(tag.to_string()),
                Err(e) => tracing::debug!("Ignoring local reference {}: {}", reference, e),
            }
        }

        // Dangling images only keep their repository through repo digests
        if tags_by_repo.is_empty() {
            for reference in &summary.repo_digests {
                if let Some((repo, _)) = reference.split_once('@')
                    && repo != NONE_REFERENCE
                    && let Ok(name) = RepositoryName::new(repo)
                {
                    tags_by_repo.entry(name).or_default();
                }
            }
        }

        if tags_by_repo.is_empty() {
            tracing::debug!("Image {} belongs to no repository, skipping", digest);
        }

        for (repo, tags) in tags_by_repo {
            let record = ImageRecord {
                digest: Some(digest.clone()),
                tags: tags.clone(),
                pushed_at,
            };
            index.entry(repo).or_default().push((record, tags));
        }
    }

    index
}

impl EngineRegistry {
    pub fn new(client: Docker, engine_type: EngineType) -> Self {
        Self {
            client,
            engine_type,
            index: Mutex::new(BTreeMap::new()),
        }
    }

    /// Connect to the engine socket found by detection.
    pub fn connect(info: &EngineInfo) -> Result<Self, BackendError> {
        let client =
            Docker::connect_with_unix(&info.socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| BackendError::EngineConnect {
                    message: format!("{}: {}", info.socket_path, e),
                })?;
        Ok(Self::new(client, info.engine_type))
    }

    async fn refresh(&self) -> Result<(), String> {
        let opts = ListImagesOptions {
            all: false,
            ..Default::default()
        };
        let summaries = self
            .client
            .list_images(Some(opts))
            .await
            .map_err(|e| e.to_string())?;

        tracing::debug!("{} reported {} image(s)", self.engine_type, summaries.len());
        *self.index.lock() = build_index(summaries);
        Ok(())
    }

    /// Tags `repository` holds on image `digest`, from the last listing.
    fn tags_of(&self, repository: &RepositoryName, digest: &Digest) -> Option<Vec<String>> {
        self.index.lock().get(repository).and_then(|images| {
            images
                .iter()
                .find(|(record, _)| record.digest.as_ref() == Some(digest))
                .map(|(_, tags)| tags.clone())
        })
    }

    async fn remove(&self, reference: &str) -> Result<(), String> {
        let opts = RemoveImageOptions {
            force: false,
            ..Default::default()
        };
        self.client
            .remove_image(reference, Some(opts), None)
            .await
            .map(|_| ())
            .map_err(map_remove_error)
    }
}

impl Sealed for EngineRegistry {}

#[async_trait]
impl Inventory for EngineRegistry {
    async fn list_repositories(&self) -> Result<Vec<RepositoryName>, FetchError> {
        self.refresh().await.map_err(FetchError::Repositories)?;
        Ok(self.index.lock().keys().cloned().collect())
    }

    async fn list_images(
        &self,
        repository: &RepositoryName,
    ) -> Result<Vec<ImageRecord>, FetchError> {
        self.refresh()
            .await
            .map_err(|message| FetchError::Images {
                repository: repository.clone(),
                message,
            })?;

        Ok(self
            .index
            .lock()
            .get(repository)
            .map(|images| images.iter().map(|(record, _)| record.clone()).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ImageDeleter for EngineRegistry {
    async fn delete_batch(
        &self,
        repository: &RepositoryName,
        digests: &[Digest],
    ) -> Result<BatchOutcome, DeleteError> {
        let mut outcome = BatchOutcome::default();

        for digest in digests {
            let Some(tags) = self.tags_of(repository, digest) else {
                outcome.failures.push(DeletionFailure::new(
                    digest.clone(),
                    format!("ImageNotFound: not listed in {}", repository),
                ));
                continue;
            };

            let references: Vec<String> = if tags.is_empty() {
                vec![digest.to_string()]
            } else {
                tags.iter().map(|t| format!("{}:{}", repository, t)).collect()
            };

            let mut errors: Vec<String> = Vec::new();
            for reference in &references {
                if let Err(e) = self.remove(reference).await {
                    errors.push(e);
                }
            }

            if errors.is_empty() {
                outcome.deleted.push(digest.clone());
            } else {
                outcome
                    .failures
                    .push(DeletionFailure::new(digest.clone(), errors.join("; ")));
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, tags: &[&str], digests: &[&str], created: i64) -> ImageSummary {
        ImageSummary {
            id: id.to_string(),
            repo_tags: tags.iter().map(|s| s.to_string()).collect(),
            repo_digests: digests.iter().map(|s| s.to_string()).collect(),
            created,
            ..Default::default()
        }
    }

    #[test]
    fn split_reference_keeps_registry_port() {
        assert_eq!(split_reference("app:v1"), Some(("app", "v1")));
        assert_eq!(
            split_reference("host:5000/team/app:v1"),
            Some(("host:5000/team/app", "v1"))
        );
        assert_eq!(split_reference("host:5000/app"), None);
    }

    #[test]
    fn index_groups_by_repository() {
        let index = build_index(vec![
            summary("sha256:1", &["web:prod-1", "api:prod-1"], &[], 1_700_000_000),
            summary("sha256:2", &["web:prod-2"], &[], 1_700_100_000),
        ]);

        let web = RepositoryName::new("web").unwrap();
        let api = RepositoryName::new("api").unwrap();
        assert_eq!(index[&web].len(), 2);
        assert_eq!(index[&api].len(), 1);
        assert_eq!(index[&api][0].1, vec!["prod-1"]);
    }

    #[test]
    fn dangling_image_lands_untagged_in_its_repository() {
        let index = build_index(vec![summary(
            "sha256:3",
            &["<none>:<none>"],
            &["web@sha256:feed"],
            1_700_000_000,
        )]);

        let web = RepositoryName::new("web").unwrap();
        let (record, tags) = &index[&web][0];
        assert!(record.tags.is_empty());
        assert!(tags.is_empty());
    }

    #[test]
    fn orphan_dangling_image_is_skipped() {
        let index = build_index(vec![summary("sha256:4", &[], &[], 0)]);
        assert!(index.is_empty());
    }
}
