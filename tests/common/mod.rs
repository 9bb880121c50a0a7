use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

static TRACING_INIT: Once = Once::new();

/// Installs a stderr tracing subscriber once per test binary, so `cargo test
/// -- --nocapture` shows the engine's own `tracing` instrumentation.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// A temporary project directory, optionally backed by a git repo, used by
/// the end-to-end scenario tests.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn new_with_git() -> Self {
        let project = Self::new();
        project.run_git(&["init", "-q", "--initial-branch=main"]);
        project.run_git(&["config", "user.email", "test@example.com"]);
        project.run_git(&["config", "user.name", "Holocron Test"]);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, relative_path: &str, content: &str) {
        let full = self.dir.path().join(relative_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(&full, content).expect("failed to write file");
    }

    pub fn run_git(&self, args: &[&str]) {
        let status = std::process::Command::new("git")
            .args(args)
            .current_dir(self.path())
            .status()
            .expect("failed to run git");
        assert!(status.success(), "git {args:?} failed");
    }

    pub fn git_commit(&self, message: &str) {
        self.run_git(&["add", "-A"]);
        self.run_git(&["commit", "-q", "-m", message, "--allow-empty"]);
    }

    pub fn head_commit(&self) -> String {
        let output = std::process::Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.path())
            .output()
            .expect("failed to resolve HEAD");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }
}

/// Returns a fresh `EngineConfig` pointed at a database file under its own
/// temp directory, distinct from `project`'s temp directory.
pub fn engine_config() -> (TempDir, holocron::config::EngineConfig) {
    let db_dir = TempDir::new().expect("failed to create temp db dir");
    let config = holocron::config::EngineConfig {
        persist_path: db_path(&db_dir),
        ..Default::default()
    };
    (db_dir, config)
}

fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("index.db")
}
