//! Shared test utilities for unisync crates.
//!
//! Provides env-var guards and a tempdir fixture that mimics the on-disk
//! layout of the supported tool formats.

use std::path::PathBuf;
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// Standard test fixture with pre-created directory structure.
///
/// Holds the tempdir and provides the per-format config directories.
/// The tempdir is automatically cleaned up when this struct is dropped.
pub struct TestFixture {
    pub tempdir: tempfile::TempDir,
    /// Path to `.claude/agents` in the temp environment.
    pub claude_agents: PathBuf,
    /// Path to `.github/agents` in the temp environment.
    pub copilot_agents: PathBuf,
    /// Path to `.codex/prompts` in the temp environment.
    pub codex_prompts: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with the standard directory structure.
    ///
    /// Does NOT set HOME - use `home_guard()` for that.
    pub fn new() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let claude_agents = tempdir.path().join(".claude/agents");
        let copilot_agents = tempdir.path().join(".github/agents");
        let codex_prompts = tempdir.path().join(".codex/prompts");

        std::fs::create_dir_all(&claude_agents)?;
        std::fs::create_dir_all(&copilot_agents)?;
        std::fs::create_dir_all(&codex_prompts)?;

        Ok(Self {
            tempdir,
            claude_agents,
            copilot_agents,
            codex_prompts,
        })
    }

    /// Get the path that should be set as HOME.
    pub fn home_path(&self) -> &std::path::Path {
        self.tempdir.path()
    }

    /// Create an RAII guard that sets HOME to this fixture's temp directory.
    pub fn home_guard(&self) -> EnvVarGuard {
        set_env_var("HOME", self.home_path().to_str())
    }

    /// Write an agent file with standard frontmatter into the Claude
    /// agents directory. Returns the file path.
    pub fn create_claude_agent(
        &self,
        name: &str,
        description: &str,
        body: &str,
    ) -> std::io::Result<PathBuf> {
        let content = format!(
            "---\nname: {}\ndescription: {}\n---\n{}",
            name, description, body
        );
        let path = self.claude_agents.join(format!("{name}.md"));
        std::fs::write(&path, content)?;
        Ok(path)
    }
}
