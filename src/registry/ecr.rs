// ABOUTME: Amazon ECR backend built on aws-sdk-ecr.
// ABOUTME: Paginates DescribeRepositories/DescribeImages and deletes through BatchDeleteImage.

use super::traits::sealed::Sealed;
use super::traits::{BatchOutcome, DeleteError, DeletionFailure, FetchError, ImageDeleter, Inventory};
use crate::retention::ImageRecord;
use crate::types::{Digest, RepositoryName};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ecr::Client;
use aws_sdk_ecr::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ecr::primitives::DateTime as SmithyDateTime;
use aws_sdk_ecr::types::{ImageDetail, ImageIdentifier};
use chrono::{DateTime, Utc};

const THROTTLING_CODES: &[&str] = &["ThrottlingException", "TooManyRequestsException"];
const AUTH_CODES: &[&str] = &[
    "AccessDeniedException",
    "UnrecognizedClientException",
    "ExpiredTokenException",
    "InvalidSignatureException",
];

/// Registry backed by Amazon ECR in one region.
pub struct EcrRegistry {
    client: Client,
}

impl EcrRegistry {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the AWS default provider chain.
    ///
    /// `region` overrides the region the provider chain would pick.
    pub async fn connect(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;
        tracing::debug!(
            "ECR client configured for region {:?}",
            config.region().map(|r| r.as_ref().to_string())
        );
        Self::new(Client::new(&config))
    }
}

/// Map an SDK failure onto [`FetchError`], picking out throttling and
/// credential problems by error code.
fn map_fetch_error<E>(err: &E, fallback: impl FnOnce(String) -> FetchError) -> FetchError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = DisplayErrorContext(err).to_string();
    match err.code() {
        Some(code) if THROTTLING_CODES.contains(&code) => FetchError::Throttled(message),
        Some(code) if AUTH_CODES.contains(&code) => FetchError::Unauthorized(message),
        _ => fallback(message),
    }
}

fn to_chrono(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

fn to_record(detail: &ImageDetail) -> ImageRecord {
    ImageRecord {
        digest: Digest::parse_optional(detail.image_digest()),
        tags: detail.image_tags().to_vec(),
        pushed_at: detail.image_pushed_at().and_then(to_chrono),
    }
}

impl Sealed for EcrRegistry {}

#[async_trait]
impl Inventory for EcrRegistry {
    async fn list_repositories(&self) -> Result<Vec<RepositoryName>, FetchError> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_repositories()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| map_fetch_error(&e, FetchError::Repositories))?;

            for repository in response.repositories() {
                let Some(name) = repository.repository_name() else {
                    continue;
                };
                match RepositoryName::new(name) {
                    Ok(name) => names.push(name),
                    Err(e) => tracing::warn!("Skipping repository {:?}: {}", name, e),
                }
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(names)
    }

    async fn list_images(
        &self,
        repository: &RepositoryName,
    ) -> Result<Vec<ImageRecord>, FetchError> {
        let mut images = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_images()
                .repository_name(repository.as_str())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    map_fetch_error(&e, |message| FetchError::Images {
                        repository: repository.clone(),
                        message,
                    })
                })?;

            images.extend(response.image_details().iter().map(to_record));

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        tracing::debug!("Fetched {} image(s) from {}", images.len(), repository);
        Ok(images)
    }
}

#[async_trait]
impl ImageDeleter for EcrRegistry {
    async fn delete_batch(
        &self,
        repository: &RepositoryName,
        digests: &[Digest],
    ) -> Result<BatchOutcome, DeleteError> {
        let image_ids: Vec<ImageIdentifier> = digests
            .iter()
            .map(|d| ImageIdentifier::builder().image_digest(d.as_str()).build())
            .collect();

        let response = self
            .client
            .batch_delete_image()
            .repository_name(repository.as_str())
            .set_image_ids(Some(image_ids))
            .send()
            .await
            .map_err(|e| {
                if e.code() == Some("RepositoryNotFoundException") {
                    DeleteError::RepositoryNotFound(repository.to_string())
                } else {
                    DeleteError::Batch(DisplayErrorContext(&e).to_string())
                }
            })?;

        // One entry per removed tag; the executor collapses duplicates
        let deleted = response
            .image_ids()
            .iter()
            .filter_map(|id| Digest::parse_optional(id.image_digest()))
            .collect();

        let failures = response
            .failures()
            .iter()
            .filter_map(|failure| {
                let digest =
                    Digest::parse_optional(failure.image_id().and_then(|id| id.image_digest()))?;
                let code = failure
                    .failure_code()
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                let reason = match failure.failure_reason() {
                    Some(reason) => format!("{}: {}", code, reason),
                    None => code,
                };
                Some(DeletionFailure::new(digest, reason))
            })
            .collect();

        Ok(BatchOutcome { deleted, failures })
    }
}
