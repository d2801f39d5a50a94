//! End-to-end runs of the wasm-deploy binary.
//!
//! qmake, make and brotli are replaced by small shell scripts that log their
//! arguments to `calls.log`, so every test can check which external steps ran
//! and with what. Deploy runs point the AWS clients at a closed local port.

#![cfg(unix)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serial_test::serial;
use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

const TOOLCHAIN_VAR: &str = "WASM_DEPLOY_STUB_TOOLCHAIN";

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let src = root.path().join("src");
        let bin = root.path().join("bin");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&bin).unwrap();

        fs::write(src.join("index.html"), "<html>entry</html>").unwrap();
        fs::write(src.join("qtloader.js"), "// patched loader").unwrap();
        fs::write(src.join("canonic.pro"), "TEMPLATE = app").unwrap();

        let log = root.path().join("calls.log");
        let log = log.display();

        write_script(
            &bin.join("qmake"),
            &format!("echo \"qmake $*\" >> \"{log}\"\ntest -f \"$1\" || exit 7\n"),
        );
        write_script(
            &bin.join("make"),
            &format!(
                "echo \"make $*\" >> \"{log}\"\n\
                 mkdir -p \"$1\"\n\
                 printf 'wasm-binary' > \"$1/canonic.wasm\"\n\
                 printf 'js-glue' > \"$1/canonic.js\"\n"
            ),
        );
        write_script(
            &bin.join("brotli"),
            &format!("echo \"brotli $*\" >> \"{log}\"\ncp \"$1\" \"$3\"\n"),
        );
        Self { root }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn build_dir(&self) -> PathBuf {
        self.path("build")
    }

    fn output_dir(&self) -> PathBuf {
        self.build_dir().join("release")
    }

    /// The binary with the toolchain marked active and no tool paths set.
    fn bare_cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("wasm-deploy");
        cmd.env(TOOLCHAIN_VAR, self.root.path())
            .arg("--toolchain-env")
            .arg(TOOLCHAIN_VAR)
            .arg("--profile")
            .arg("release");
        cmd
    }

    /// The binary wired to the stub tools by absolute path.
    fn cmd(&self) -> Command {
        let mut cmd = self.bare_cmd();
        cmd.arg("--build-dir")
            .arg(self.build_dir())
            .arg("--source-dir")
            .arg(self.path("src"))
            .arg("--qmake")
            .arg(self.path("bin/qmake"))
            .arg("--make")
            .arg(self.path("bin/make"))
            .arg("--brotli")
            .arg(self.path("bin/brotli"));
        cmd
    }

    fn calls(&self) -> Vec<String> {
        match fs::read_to_string(self.path("calls.log")) {
            Ok(log) => log.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|line| line.starts_with(prefix))
            .collect()
    }
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// AWS settings that make every request fail fast without leaving the host.
fn unreachable_aws(cmd: &mut Command) -> &mut Command {
    cmd.env("AWS_ENDPOINT_URL", "http://127.0.0.1:1")
        .env("AWS_REGION", "us-east-1")
        .env("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
        .env("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
        .env("AWS_MAX_ATTEMPTS", "1")
        .env("AWS_EC2_METADATA_DISABLED", "true")
        .env("AWS_CONFIG_FILE", "/nonexistent/aws/config")
        .env("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/aws/credentials")
        .env_remove("AWS_PROFILE")
}

// =============================================================================
// Toolchain check
// =============================================================================

#[test]
#[serial]
fn missing_toolchain_aborts_before_touching_disk() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.output_dir()).unwrap();
    fs::write(fx.output_dir().join("stale.wasm"), "old").unwrap();

    fx.cmd()
        .env_remove(TOOLCHAIN_VAR)
        .assert()
        .failure()
        .stderr(predicate::str::contains(TOOLCHAIN_VAR));

    assert!(fx.output_dir().join("stale.wasm").exists());
    assert!(fx.calls().is_empty());
}

// =============================================================================
// Local build
// =============================================================================

#[test]
#[serial]
fn no_deploy_builds_and_stages_only() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.output_dir()).unwrap();
    fs::write(fx.output_dir().join("stale.wasm"), "old").unwrap();

    fx.cmd().arg("--no-deploy").assert().success();

    let out = fx.output_dir();
    assert!(!out.join("stale.wasm").exists());
    assert!(out.join("canonic.wasm").exists());
    assert_eq!(
        fs::read_to_string(out.join("index.html")).unwrap(),
        "<html>entry</html>"
    );
    assert_eq!(
        fs::read_to_string(out.join("qtloader.js")).unwrap(),
        "// patched loader"
    );
    assert!(!out.join("sitemap.xml").exists());
    assert!(!out.join("canonic.release.wasm").exists());
    assert!(!out.join("canonic.release.js").exists());

    let qmake = fx.calls_starting_with("qmake");
    assert_eq!(qmake.len(), 1);
    assert!(qmake[0].ends_with("canonic.pro CONFIG-=debug CONFIG+=release CONFIG+=wasm"));
    assert_eq!(fx.calls_starting_with("make"), ["make release"]);
    assert!(fx.calls_starting_with("brotli").is_empty());
}

#[test]
#[serial]
fn relative_paths_resolve_from_invocation_dir() {
    let fx = Fixture::new();

    fx.bare_cmd()
        .current_dir(fx.root.path())
        .args([
            "--no-deploy",
            "--source-dir",
            "src",
            "--build-dir",
            "build",
            "--qmake",
            "bin/qmake",
            "--make",
            "bin/make",
        ])
        .assert()
        .success();

    let qmake = fx.calls_starting_with("qmake");
    assert_eq!(qmake.len(), 1);
    let project = qmake[0].split_whitespace().nth(1).unwrap();
    assert!(Path::new(project).is_absolute());
    assert!(project.ends_with("src/canonic.pro"));
    assert!(fx.output_dir().join("canonic.wasm").exists());
    assert_eq!(
        fs::read_to_string(fx.output_dir().join("index.html")).unwrap(),
        "<html>entry</html>"
    );
}

#[test]
#[serial]
fn debug_profile_inverts_config_and_output_dir() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["--no-deploy", "--profile", "debug"])
        .assert()
        .success();

    let debug_out = fx.build_dir().join("debug");
    assert!(debug_out.join("canonic.wasm").exists());
    assert!(debug_out.join("index.html").exists());

    let qmake = fx.calls_starting_with("qmake");
    assert!(qmake[0].ends_with("CONFIG+=debug CONFIG-=release CONFIG+=wasm"));
    assert_eq!(fx.calls_starting_with("make"), ["make debug"]);
}

#[test]
#[serial]
fn failing_build_exits_non_zero_without_staging() {
    let fx = Fixture::new();
    write_script(&fx.path("bin/make"), "exit 2\n");

    fx.cmd()
        .arg("--no-deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("status 2"));

    assert!(!fx.output_dir().join("index.html").exists());
}

// =============================================================================
// Deploy
// =============================================================================

#[test]
#[serial]
fn deploy_attempts_every_upload_then_fails_on_invalidation() {
    let fx = Fixture::new();

    let mut cmd = fx.cmd();
    let run = unreachable_aws(&mut cmd)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Uploading sitemap.xml"))
        .stdout(predicate::str::contains("Uploading qtloader.js"))
        .stdout(predicate::str::contains("Uploading canonic.release.js"))
        .stdout(predicate::str::contains("Uploading canonic.release.wasm"))
        .stdout(predicate::str::contains("Invalidating CDN content"))
        .stderr(predicate::str::contains("deploying to bucket `www.canonic.com`"));

    // One result line per file.
    let stdout = String::from_utf8_lossy(&run.get_output().stdout);
    assert_eq!(stdout.matches("upload finished").count(), 4);
    assert!(!stdout.contains("upload result"));

    let out = fx.output_dir();
    let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
    assert_eq!(sitemap.matches("<url>").count(), 1);
    assert!(sitemap.contains("<loc>https://www.canonic.com/</loc>"));
    assert_eq!(
        fs::read_to_string(out.join("canonic.release.wasm")).unwrap(),
        "wasm-binary"
    );
    assert!(out.join("canonic.wasm").exists());
    assert_eq!(
        fs::read_to_string(out.join("canonic.release.js")).unwrap(),
        "js-glue"
    );
    assert_eq!(
        fx.calls_starting_with("brotli"),
        ["brotli canonic.wasm -o canonic.release.wasm"]
    );
}
