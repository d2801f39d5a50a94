//! Remote phase: sitemap, compression, uploads and CDN invalidation.

use crate::{
    config::AppConfig,
    errors::DeployResult,
    models::{artifact::ReleaseArtifacts, upload::UploadOutcome},
    services::{
        cdn_service::{self, Cdn},
        manifest_service,
        packaging_service::PackagingService,
        storage_service::{self, ObjectStore},
    },
};
use chrono::Utc;
use std::path::Path;
use tracing::{info, warn};

/// What a deploy did remotely.
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub uploads: Vec<UploadOutcome>,
    pub invalidation_id: String,
}

impl DeployReport {
    pub fn failed_uploads(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.uploads.iter().filter(|o| !o.uploaded)
    }
}

/// Generate the sitemap, package the build output, then publish it.
pub async fn run_deploy<S: ObjectStore, C: Cdn>(
    cfg: &AppConfig,
    store: &S,
    cdn: &C,
) -> DeployResult<DeployReport> {
    let output_dir = cfg.output_dir();
    let artifacts = ReleaseArtifacts::new(&cfg.artifact_name, cfg.profile);

    manifest_service::write_sitemap(&output_dir, &cfg.site_url, Utc::now()).await?;

    let packaged = PackagingService::new(cfg.brotli.clone(), output_dir.clone(), artifacts.clone())
        .package()
        .await?;
    info!(
        wasm = %packaged.compressed_wasm.display(),
        script = %packaged.script.display(),
        decompressed_len = packaged.decompressed_len,
        "Release packaged"
    );

    publish(cfg, store, cdn, &output_dir, &artifacts, packaged.decompressed_len).await
}

/// Upload the four release files and invalidate their CDN paths.
///
/// Rejected uploads are tolerated and the invalidation still covers every
/// path. A local failure (a staged file gone missing) aborts before the CDN
/// is touched.
pub async fn publish<S: ObjectStore, C: Cdn>(
    cfg: &AppConfig,
    store: &S,
    cdn: &C,
    output_dir: &Path,
    artifacts: &ReleaseArtifacts,
    decompressed_len: u64,
) -> DeployResult<DeployReport> {
    info!(bucket = %cfg.bucket, "Starting file uploads");
    let uploads = artifacts.uploads(output_dir, decompressed_len);
    let outcomes = storage_service::upload_all(store, &cfg.bucket, &uploads).await?;

    let invalidation_id =
        cdn_service::invalidate(cdn, &cfg.distribution_id, artifacts.invalidation_paths()).await?;

    let report = DeployReport {
        uploads: outcomes,
        invalidation_id,
    };
    let failed: Vec<_> = report.failed_uploads().map(|o| o.key.as_str()).collect();
    if !failed.is_empty() {
        warn!(failed = ?failed, "{} of {} uploads failed", failed.len(), report.uploads.len());
    }
    Ok(report)
}
