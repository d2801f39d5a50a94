//! Local phase: toolchain check, clean build, support file staging.

use crate::{
    config::AppConfig,
    errors::{DeployError, DeployResult},
    services::build_service::BuildService,
};
use std::{env, path::PathBuf};
use tracing::info;

/// Refuse to run unless the toolchain environment has been activated.
///
/// Runs before anything touches the filesystem.
pub fn ensure_toolchain(cfg: &AppConfig) -> DeployResult<()> {
    if env::var_os(&cfg.toolchain_env).is_none() {
        return Err(DeployError::ToolchainNotConfigured(cfg.toolchain_env.clone()));
    }
    Ok(())
}

/// Reset the build tree, configure, build and stage the support files.
///
/// Returns the output directory holding the fresh artifacts.
pub async fn run_build(cfg: &AppConfig) -> DeployResult<PathBuf> {
    let build = BuildService::new(cfg);

    build.reset_build_dir().await?;
    build.configure().await?;
    build.compile().await?;
    let staged = build.stage_support_files().await?;

    let output_dir = build.output_dir();
    info!(
        profile = %build.profile,
        staged = staged.len(),
        "Build ready in {}",
        output_dir.display()
    );
    Ok(output_dir)
}
