//! Shared testing utilities for yamlprops integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated working directory with its own settings and state file.
pub struct TestContext {
    root: TempDir,
    work_dir: PathBuf,
}

impl TestContext {
    /// Create a new isolated environment using default GitHub settings.
    pub fn new() -> Self {
        Self::with_settings("")
    }

    /// Create an environment whose GitHub API points at `api_url` with credential `gh`.
    pub fn with_api(api_url: &str) -> Self {
        Self::with_settings(&format!(
            r#"
[github]
api_url = "{api_url}"
timeout_secs = 5

[credentials.gh]
token = "secret-token"
"#
        ))
    }

    fn with_settings(extra: &str) -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        let work_dir = root.path().join("work");
        fs::create_dir_all(&work_dir).expect("Failed to create test work directory");

        let settings = format!("[storage]\nstate_path = \"state/registry.json\"\n{extra}");
        fs::write(work_dir.join("yamlprops.toml"), settings).expect("Failed to write settings");

        Self { root, work_dir }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.work_dir.join("state/registry.json")
    }

    /// Build a command for the compiled binary inside the work directory.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("yamlprops").expect("Failed to locate yamlprops binary");
        cmd.current_dir(&self.work_dir)
            .env_remove("YAMLPROPS_SETTINGS")
            .env("YAMLPROPS_LOG", "error");
        cmd
    }

    /// Write a batch file into the work directory and return its name.
    pub fn write_batch(&self, name: &str, content: &str) -> String {
        fs::write(self.work_dir.join(name), content).expect("Failed to write batch file");
        name.to_string()
    }

    pub fn read_state(&self) -> serde_json::Value {
        let content = fs::read_to_string(self.state_path()).expect("Failed to read state");
        serde_json::from_str(&content).expect("State is not valid JSON")
    }
}

/// Two inline configs in one category plus an empty uncategorized one.
pub const INLINE_BATCH: &str = r#"
refresh_interval_minutes: 15
configs:
  - name: app
    category: services
    source:
      kind: inline
      text: |
        region: eu
        replicas: 3
        tags: [blue, green]
  - name: db
    category: services
    source:
      kind: inline
      text: |
        host: db.internal
  - name: blank
    source:
      kind: inline
      text: ""
"#;

/// One remote config served from `acme/ops@main:shared.yml`.
pub const REMOTE_BATCH: &str = r#"
configs:
  - name: shared
    category: remote
    source:
      kind: remote
      repository_owner: acme
      repository_name: ops
      ref: main
      path: shared.yml
      credential_id: gh
"#;
