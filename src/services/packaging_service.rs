//! Turns raw build output into the files that get published: the brotli
//! compressed binary and the profile-suffixed script copy.

use crate::{
    errors::{DeployError, DeployResult},
    models::artifact::ReleaseArtifacts,
    services::process,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

#[derive(Clone, Debug)]
pub struct PackagingService {
    /// brotli executable.
    pub brotli: String,

    /// Build output directory; all inputs and outputs live here.
    pub output_dir: PathBuf,

    pub artifacts: ReleaseArtifacts,
}

/// Files produced by [`PackagingService::package`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackagedRelease {
    pub compressed_wasm: PathBuf,
    pub script: PathBuf,
    /// Size of the uncompressed binary in bytes.
    pub decompressed_len: u64,
}

impl PackagingService {
    pub fn new(brotli: impl Into<String>, output_dir: impl Into<PathBuf>, artifacts: ReleaseArtifacts) -> Self {
        Self {
            brotli: brotli.into(),
            output_dir: output_dir.into(),
            artifacts,
        }
    }

    pub async fn package(&self) -> DeployResult<PackagedRelease> {
        let decompressed_len = self.built_wasm_len().await?;
        let compressed_wasm = self.compress_wasm().await?;
        let script = self.publish_script().await?;
        Ok(PackagedRelease {
            compressed_wasm,
            script,
            decompressed_len,
        })
    }

    /// Compress the built binary next to itself; the uncompressed file stays in place.
    pub async fn compress_wasm(&self) -> DeployResult<PathBuf> {
        let source = &self.artifacts.built_wasm;
        let target = &self.artifacts.published_wasm;
        require_file(&self.output_dir.join(source)).await?;

        info!("Compressing {} via brotli to {}", source, target);
        process::run_captured(
            &self.brotli,
            [source.as_str(), "-o", target.as_str()],
            Some(self.output_dir.as_path()),
        )
        .await?;

        let compressed = self.output_dir.join(target);
        require_file(&compressed).await?;
        Ok(compressed)
    }

    /// Copy the built script to its published name.
    pub async fn publish_script(&self) -> DeployResult<PathBuf> {
        let source = self.output_dir.join(&self.artifacts.built_js);
        let target = self.output_dir.join(&self.artifacts.published_js);
        require_file(&source).await?;

        info!(
            "Copying {} to {}",
            self.artifacts.built_js, self.artifacts.published_js
        );
        fs::copy(&source, &target).await?;
        Ok(target)
    }

    async fn built_wasm_len(&self) -> DeployResult<u64> {
        let path = self.output_dir.join(&self.artifacts.built_wasm);
        require_file(&path).await?;
        Ok(fs::metadata(&path).await?.len())
    }
}

async fn require_file(path: &Path) -> DeployResult<()> {
    if fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(DeployError::MissingFile(path.to_path_buf()))
    }
}
