use super::settings::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Deserialize, Serialize)]
struct UiStateFile {
    /// Working-directory path -> flag name -> value
    #[serde(default)]
    repositories: BTreeMap<String, BTreeMap<String, bool>>,
}

/// Boolean UI flags remembered per working directory across runs
#[derive(Debug)]
pub struct UiStateStore {
    path: PathBuf,
    state: UiStateFile,
}

impl UiStateStore {
    /// Open `ui_state.toml` in the config directory
    pub fn open_default() -> Result<Self, ConfigError> {
        Self::open(Config::config_dir()?.join("ui_state.toml"))
    }

    /// A missing file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let state = if path.exists() {
            toml::from_str(&fs::read_to_string(&path)?)?
        } else {
            UiStateFile::default()
        };
        Ok(Self { path, state })
    }

    pub fn get_flag(&self, work_dir: &Path, name: &str, default: bool) -> bool {
        self.state
            .repositories
            .get(&Self::key(work_dir))
            .and_then(|flags| flags.get(name))
            .copied()
            .unwrap_or(default)
    }

    /// Record `value` and write the file straight away
    pub fn set_flag(&mut self, work_dir: &Path, name: &str, value: bool) -> Result<(), ConfigError> {
        self.state
            .repositories
            .entry(Self::key(work_dir))
            .or_default()
            .insert(name.to_string(), value);
        debug!(work_dir = %work_dir.display(), flag = name, value, "ui flag stored");
        self.save()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, toml::to_string_pretty(&self.state)?)?;
        Ok(())
    }

    fn key(work_dir: &Path) -> String {
        work_dir.to_string_lossy().into_owned()
    }
}
