//! CDN cache invalidation on a CloudFront distribution.

use crate::{
    errors::{DeployError, DeployResult},
    models::invalidation::InvalidationBatch,
};
use aws_config::SdkConfig;
use aws_sdk_cloudfront::{
    Client,
    error::DisplayErrorContext,
    types::{InvalidationBatch as CloudFrontBatch, Paths},
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Anything that can invalidate paths on a distribution.
pub trait Cdn {
    /// Submit `batch` and return the provider-assigned invalidation id.
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        batch: &InvalidationBatch,
    ) -> DeployResult<String>;
}

/// [`Cdn`] backed by the CloudFront SDK client.
#[derive(Clone, Debug)]
pub struct CloudFrontCdn {
    client: Client,
}

impl CloudFrontCdn {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

impl Cdn for CloudFrontCdn {
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        batch: &InvalidationBatch,
    ) -> DeployResult<String> {
        let output = self
            .client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(to_cloudfront_batch(batch)?)
            .send()
            .await
            .map_err(|err| DeployError::Cdn(DisplayErrorContext(&err).to_string()))?;

        let invalidation = output
            .invalidation()
            .ok_or_else(|| DeployError::Cdn("response carried no invalidation".into()))?;
        debug!(status = invalidation.status(), "invalidation accepted");
        Ok(invalidation.id().to_string())
    }
}

fn to_cloudfront_batch(batch: &InvalidationBatch) -> DeployResult<CloudFrontBatch> {
    let quantity = i32::try_from(batch.paths.quantity)
        .map_err(|_| DeployError::Cdn(format!("too many paths: {}", batch.paths.quantity)))?;
    let paths = Paths::builder()
        .quantity(quantity)
        .set_items(Some(batch.paths.items.clone()))
        .build()
        .map_err(|err| DeployError::Cdn(err.to_string()))?;

    CloudFrontBatch::builder()
        .paths(paths)
        .caller_reference(&batch.caller_reference)
        .build()
        .map_err(|err| DeployError::Cdn(err.to_string()))
}

/// Clock-derived uniqueness token: microseconds since the epoch, digits only.
pub fn caller_reference(now: DateTime<Utc>) -> String {
    now.timestamp_micros().to_string()
}

/// Invalidate `paths` on `distribution_id` with a fresh caller reference.
pub async fn invalidate<C: Cdn>(
    cdn: &C,
    distribution_id: &str,
    paths: Vec<String>,
) -> DeployResult<String> {
    let batch = InvalidationBatch::new(paths, caller_reference(Utc::now()));
    info!(
        distribution_id,
        paths = ?batch.paths.items,
        caller_reference = %batch.caller_reference,
        "Invalidating CDN content"
    );
    let id = cdn.create_invalidation(distribution_id, &batch).await?;
    info!(invalidation_id = %id, "Invalidation created");
    Ok(id)
}
