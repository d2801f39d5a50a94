use std::{io, path::PathBuf};
use thiserror::Error;

/// Everything that can stop a build or deploy.
///
/// `Storage` errors are the only ones the upload step swallows: it logs them
/// and carries on with the next file. Everything else propagates.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("toolchain environment variable `{0}` is not set; source the toolchain env script first")]
    ToolchainNotConfigured(String),
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with {}{}", exit_code_label(.code), stderr_suffix(.stderr))]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("storage rejected `{key}`: {message}")]
    Storage { key: String, message: String },
    #[error("CDN request failed: {0}")]
    Cdn(String),
    #[error("required file `{}` not found", .0.display())]
    MissingFile(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type DeployResult<T> = Result<T, DeployError>;

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}
