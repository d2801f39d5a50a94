//! Build profile selection (release vs. debug).

use clap::ValueEnum;
use std::{fmt, path::PathBuf, str::FromStr};

const RELEASE_BUILD_DIR: &str = "/mnt/s/canonic/build-canonic-wasm";
const DEBUG_BUILD_DIR: &str = "/mnt/s/canonic/build-canonic-wasm-debug";

/// Which flavour of the application gets built.
///
/// The profile decides the qmake `CONFIG` flags, the `make` target, the
/// output sub-directory and the suffix baked into published file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BuildProfile {
    #[default]
    Release,
    Debug,
}

impl BuildProfile {
    /// Suffix used for the make target, output directory and published names.
    pub fn suffix(self) -> &'static str {
        match self {
            BuildProfile::Release => "release",
            BuildProfile::Debug => "debug",
        }
    }

    /// `CONFIG` arguments handed to qmake after the project file.
    pub fn qmake_config(self) -> [&'static str; 3] {
        match self {
            BuildProfile::Release => ["CONFIG-=debug", "CONFIG+=release", "CONFIG+=wasm"],
            BuildProfile::Debug => ["CONFIG+=debug", "CONFIG-=release", "CONFIG+=wasm"],
        }
    }

    pub fn default_build_dir(self) -> PathBuf {
        match self {
            BuildProfile::Release => PathBuf::from(RELEASE_BUILD_DIR),
            BuildProfile::Debug => PathBuf::from(DEBUG_BUILD_DIR),
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for BuildProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "release" => Ok(BuildProfile::Release),
            "debug" => Ok(BuildProfile::Debug),
            other => Err(format!("unknown build profile `{}`", other)),
        }
    }
}
