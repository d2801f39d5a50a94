use crate::models::profile::BuildProfile;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::{
    env,
    path::{Path, PathBuf},
};

const DEFAULT_TOOLCHAIN_ENV: &str = "EMSDK";
const DEFAULT_QMAKE: &str = "/mnt/s/qt/build/qtbase/bin/qmake";
const DEFAULT_PROJECT_FILE: &str = "canonic.pro";
const DEFAULT_BUCKET: &str = "www.canonic.com";
const DEFAULT_DISTRIBUTION_ID: &str = "E783CEX3P81S7";
const DEFAULT_SITE_URL: &str = "https://www.canonic.com/";
const DEFAULT_ARTIFACT_NAME: &str = "canonic";

/// Centralized deploy configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Environment variable whose presence marks an activated toolchain.
    pub toolchain_env: String,
    pub profile: BuildProfile,
    /// Wiped and recreated on every run.
    pub build_dir: PathBuf,
    /// Holds the project file and the support files.
    pub source_dir: PathBuf,
    pub project: PathBuf,
    pub qmake: PathBuf,
    pub make: String,
    pub brotli: String,
    /// Region for the storage and CDN clients; the SDK's own chain when unset.
    pub region: Option<String>,
    pub bucket: String,
    pub distribution_id: String,
    pub site_url: String,
    /// Base name of the produced `.wasm`/`.js` pair.
    pub artifact_name: String,
    /// False when `--no-deploy` was passed.
    pub deploy: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Build a WebAssembly release and publish it to the storage bucket and CDN"
)]
pub struct Args {
    /// Build and stage locally without uploading or invalidating
    #[arg(long)]
    pub no_deploy: bool,

    /// Build profile (overrides WASM_DEPLOY_PROFILE)
    #[arg(long, value_enum)]
    pub profile: Option<BuildProfile>,

    /// Environment variable that must be set by the toolchain (overrides WASM_DEPLOY_TOOLCHAIN_ENV)
    #[arg(long)]
    pub toolchain_env: Option<String>,

    /// Build directory, wiped on every run (overrides WASM_DEPLOY_BUILD_DIR)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Source directory with the project and support files (overrides WASM_DEPLOY_SOURCE_DIR)
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Project file passed to qmake (overrides WASM_DEPLOY_PROJECT)
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// qmake executable (overrides WASM_DEPLOY_QMAKE)
    #[arg(long)]
    pub qmake: Option<PathBuf>,

    /// make executable (overrides WASM_DEPLOY_MAKE)
    #[arg(long)]
    pub make: Option<String>,

    /// brotli executable (overrides WASM_DEPLOY_BROTLI)
    #[arg(long)]
    pub brotli: Option<String>,

    /// AWS region for uploads and invalidation (overrides WASM_DEPLOY_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Destination bucket (overrides WASM_DEPLOY_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// CDN distribution to invalidate (overrides WASM_DEPLOY_DISTRIBUTION_ID)
    #[arg(long)]
    pub distribution_id: Option<String>,

    /// Site URL written into the sitemap (overrides WASM_DEPLOY_SITE_URL)
    #[arg(long)]
    pub site_url: Option<String>,

    /// Base name of the built artifacts (overrides WASM_DEPLOY_ARTIFACT_NAME)
    #[arg(long)]
    pub artifact_name: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_args(Args::parse(), |key| env::var(key))
    }

    /// Merge parsed arguments over values produced by `lookup`, falling back
    /// to built-in defaults.
    pub fn from_args<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_or = |key: &str, default: &str| -> Result<String> {
            match lookup(key) {
                Ok(value) => Ok(value),
                Err(env::VarError::NotPresent) => Ok(default.to_string()),
                Err(err) => Err(err).with_context(|| format!("reading {}", key)),
            }
        };
        let env_opt = |key: &str| -> Result<Option<String>> {
            match lookup(key) {
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", key)),
            }
        };

        // --- Environment fallback ---
        let env_profile = match env_opt("WASM_DEPLOY_PROFILE")? {
            Some(value) => value
                .parse::<BuildProfile>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("parsing WASM_DEPLOY_PROFILE value `{}`", value))?,
            None => BuildProfile::default(),
        };
        let profile = args.profile.unwrap_or(env_profile);

        // qmake runs inside the build directory, so every path handed to a
        // tool is resolved against the invocation directory up front.
        let source_dir = absolutize(
            match args.source_dir {
                Some(dir) => dir,
                None => PathBuf::from(env_or("WASM_DEPLOY_SOURCE_DIR", ".")?),
            },
            "source directory",
        )?;
        let build_dir = absolutize(
            match args.build_dir {
                Some(dir) => dir,
                None => env_opt("WASM_DEPLOY_BUILD_DIR")?
                    .map(PathBuf::from)
                    .unwrap_or_else(|| profile.default_build_dir()),
            },
            "build directory",
        )?;
        let project = absolutize(
            match args.project {
                Some(path) => path,
                None => env_opt("WASM_DEPLOY_PROJECT")?
                    .map(PathBuf::from)
                    .unwrap_or_else(|| source_dir.join(DEFAULT_PROJECT_FILE)),
            },
            "project file",
        )?;
        let qmake = match args.qmake {
            Some(path) => path,
            None => PathBuf::from(env_or("WASM_DEPLOY_QMAKE", DEFAULT_QMAKE)?),
        };
        let qmake = if qmake.components().count() > 1 {
            absolutize(qmake, "qmake")?
        } else {
            qmake
        };

        // --- Merge ---
        Ok(Self {
            toolchain_env: match args.toolchain_env {
                Some(name) => name,
                None => env_or("WASM_DEPLOY_TOOLCHAIN_ENV", DEFAULT_TOOLCHAIN_ENV)?,
            },
            profile,
            build_dir,
            source_dir,
            project,
            qmake,
            make: resolve_program(
                args.make.map_or_else(|| env_or("WASM_DEPLOY_MAKE", "make"), Ok)?,
                "make",
            )?,
            brotli: resolve_program(
                args.brotli
                    .map_or_else(|| env_or("WASM_DEPLOY_BROTLI", "brotli"), Ok)?,
                "brotli",
            )?,
            region: match args.region {
                Some(region) => Some(region),
                None => env_opt("WASM_DEPLOY_REGION")?,
            },
            bucket: args
                .bucket
                .map_or_else(|| env_or("WASM_DEPLOY_BUCKET", DEFAULT_BUCKET), Ok)?,
            distribution_id: args.distribution_id.map_or_else(
                || env_or("WASM_DEPLOY_DISTRIBUTION_ID", DEFAULT_DISTRIBUTION_ID),
                Ok,
            )?,
            site_url: args
                .site_url
                .map_or_else(|| env_or("WASM_DEPLOY_SITE_URL", DEFAULT_SITE_URL), Ok)?,
            artifact_name: args.artifact_name.map_or_else(
                || env_or("WASM_DEPLOY_ARTIFACT_NAME", DEFAULT_ARTIFACT_NAME),
                Ok,
            )?,
            deploy: !args.no_deploy,
        })
    }

    /// Directory the build tool writes its artifacts into.
    pub fn output_dir(&self) -> PathBuf {
        self.build_dir.join(self.profile.suffix())
    }
}

/// Resolve `path` against the current directory; absolute paths pass through.
fn absolutize(path: PathBuf, what: &str) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    std::path::absolute(&path).with_context(|| format!("resolving {} `{}`", what, path.display()))
}

/// Bare program names stay as-is for the `PATH` lookup; anything with a
/// separator is a path and gets resolved like the directories.
fn resolve_program(program: String, what: &str) -> Result<String> {
    if !program.contains('/') {
        return Ok(program);
    }
    absolutize(PathBuf::from(&program), what)?
        .into_os_string()
        .into_string()
        .map_err(|path| anyhow!("{} path `{}` is not valid UTF-8", what, Path::new(&path).display()))
}
