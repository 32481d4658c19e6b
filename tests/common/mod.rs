#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tripwire::config::{Config, PathList};
use tripwire::run::{CancelToken, Orchestrator, RunReport};

/// A scanned root plus private state directory, isolated per test
pub struct TestTree {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub state: PathBuf,
}

impl TestTree {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("www");
        let state = temp_dir.path().join("state");
        fs::create_dir_all(&root)?;
        fs::create_dir_all(&state)?;

        // Catalog keys are canonical, so canonicalize once up front.
        let root = root.canonicalize()?;
        Ok(Self {
            temp_dir,
            root,
            state,
        })
    }

    /// Writes `contents` at `rel` under the root, creating parents
    pub fn write(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn remove(&self, rel: &str) -> Result<()> {
        fs::remove_file(self.root.join(rel))?;
        Ok(())
    }

    /// Absolute catalog key for `rel`
    pub fn key(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.state.join("catalog.bin")
    }

    pub fn config_path(&self) -> PathBuf {
        self.state.join("config.toml")
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.scan.paths = PathList::List(vec![self.root.to_string_lossy().into_owned()]);
        config.storage.catalog_path = self.catalog_path();
        config.storage.unreadable_log = self.state.join("unreadable.log");
        config
    }

    /// Saves `config()` to `config_path()` for CLI tests
    pub fn write_config(&self) -> Result<PathBuf> {
        let path = self.config_path();
        self.config().save(&path)?;
        Ok(path)
    }

    pub fn run(&self) -> RunReport {
        self.run_with(self.config())
    }

    pub fn run_with(&self, config: Config) -> RunReport {
        Orchestrator::new(config).run(&CancelToken::new())
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}
