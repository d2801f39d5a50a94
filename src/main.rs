use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod services;

use handlers::{build_handlers, deploy_handlers};
use services::{cdn_service::CloudFrontCdn, storage_service::S3Store};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    // --- Toolchain must be active before anything touches disk ---
    build_handlers::ensure_toolchain(&cfg)?;

    tracing::info!("Starting wasm-deploy with config: {:?}", cfg);

    // --- Local build ---
    let output_dir = build_handlers::run_build(&cfg)
        .await
        .with_context(|| format!("building the {} profile", cfg.profile))?;

    if !cfg.deploy {
        tracing::info!(
            "Deploy skipped; release staged in {}",
            output_dir.display()
        );
        return Ok(());
    }

    // --- Publish ---
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &cfg.region {
        loader = loader.region(Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;
    let store = S3Store::new(&sdk_config);
    let cdn = CloudFrontCdn::new(&sdk_config);
    let report = deploy_handlers::run_deploy(&cfg, &store, &cdn)
        .await
        .with_context(|| format!("deploying to bucket `{}`", cfg.bucket))?;

    tracing::info!(invalidation_id = %report.invalidation_id, "Deploy finished");

    Ok(())
}
