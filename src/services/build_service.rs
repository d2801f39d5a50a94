//! BuildService — resets the build tree, runs qmake + make for the selected
//! profile and stages the hand-maintained support files next to the build
//! output.

use crate::{
    config::AppConfig,
    errors::{DeployError, DeployResult},
    models::{artifact::SUPPORT_FILES, profile::BuildProfile},
    services::process,
};
use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct BuildService {
    pub profile: BuildProfile,

    /// Root of the build tree; qmake and make run here.
    pub build_dir: PathBuf,

    /// Directory holding the support files to stage.
    pub source_dir: PathBuf,

    pub project: PathBuf,
    pub qmake: PathBuf,
    pub make: String,
}

impl BuildService {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            profile: cfg.profile,
            build_dir: cfg.build_dir.clone(),
            source_dir: cfg.source_dir.clone(),
            project: cfg.project.clone(),
            qmake: cfg.qmake.clone(),
            make: cfg.make.clone(),
        }
    }

    /// Where make drops the artifacts for the current profile.
    pub fn output_dir(&self) -> PathBuf {
        self.build_dir.join(self.profile.suffix())
    }

    /// Delete the build directory (if any) and recreate it empty.
    pub async fn reset_build_dir(&self) -> DeployResult<()> {
        match fs::remove_dir_all(&self.build_dir).await {
            Ok(_) => info!("Cleaned {}", self.build_dir.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} did not exist yet", self.build_dir.display());
            }
            Err(err) => return Err(DeployError::Io(err)),
        }

        info!("Creating {}", self.build_dir.display());
        fs::create_dir_all(&self.build_dir).await?;
        Ok(())
    }

    /// Generate makefiles from the project descriptor.
    pub async fn configure(&self) -> DeployResult<()> {
        let mut args = vec![self.project.as_os_str().to_owned()];
        args.extend(self.profile.qmake_config().map(OsString::from));

        info!(
            profile = %self.profile,
            project = %self.project.display(),
            "Configuring build"
        );
        process::run_inherited(&self.qmake, args, &self.build_dir).await
    }

    /// Run the profile's make target.
    pub async fn compile(&self) -> DeployResult<()> {
        info!(target = self.profile.suffix(), "Building");
        process::run_inherited(&self.make, [self.profile.suffix()], &self.build_dir).await
    }

    /// Copy the support files into the output directory, replacing any copy
    /// the build may already have put there.
    pub async fn stage_support_files(&self) -> DeployResult<Vec<PathBuf>> {
        let output_dir = self.output_dir();
        fs::create_dir_all(&output_dir).await?;

        let mut staged = Vec::with_capacity(SUPPORT_FILES.len());
        for name in SUPPORT_FILES {
            let src = self.source_dir.join(name);
            let dest = output_dir.join(name);
            copy_replacing(&src, &dest).await?;
            staged.push(dest);
        }
        Ok(staged)
    }
}

/// Remove `dest` if present, then copy `src` over.
pub async fn copy_replacing(src: &Path, dest: &Path) -> DeployResult<()> {
    if !fs::try_exists(src).await? {
        return Err(DeployError::MissingFile(src.to_path_buf()));
    }

    match fs::remove_file(dest).await {
        Ok(_) => debug!("removed stale {}", dest.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(DeployError::Io(err)),
    }

    info!("Copying {} to {}", src.display(), dest.display());
    fs::copy(src, dest).await?;
    Ok(())
}
