//! Thin wrappers around `tokio::process::Command` for the external tools
//! the pipeline drives (qmake, make, brotli).

use crate::errors::{DeployError, DeployResult};
use std::{ffi::OsStr, path::Path, process::Stdio};
use tokio::process::Command;
use tracing::debug;

/// Run `program` in `cwd`, letting it write straight to our stdout/stderr.
///
/// Used for the long-running build steps whose output the operator wants to
/// watch live. Fails on spawn errors and non-zero exit.
pub async fn run_inherited<I, S>(program: impl AsRef<OsStr>, args: I, cwd: &Path) -> DeployResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let label = program.to_string_lossy().into_owned();
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    debug!(program = %label, cwd = %cwd.display(), "spawning process");

    let status = command.status().await.map_err(|source| DeployError::Spawn {
        program: label.clone(),
        source,
    })?;

    if !status.success() {
        return Err(DeployError::CommandFailed {
            program: label,
            code: status.code(),
            stderr: String::new(),
        });
    }
    Ok(())
}

/// Run `program` in `cwd` and capture its stdout (trimmed).
///
/// stderr is captured as well and attached to the error on non-zero exit.
pub async fn run_captured<I, S>(
    program: impl AsRef<OsStr>,
    args: I,
    cwd: Option<&Path>,
) -> DeployResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let label = program.to_string_lossy().into_owned();
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    debug!(program = %label, "spawning process");

    let output = command.output().await.map_err(|source| DeployError::Spawn {
        program: label.clone(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        if !stdout.is_empty() {
            debug!(stdout = %stdout, "command stdout");
        }
        return Err(DeployError::CommandFailed {
            program: label,
            code: output.status.code(),
            stderr,
        });
    }

    if !stdout.is_empty() {
        debug!(stdout = %stdout, "command output");
    }
    Ok(stdout)
}
