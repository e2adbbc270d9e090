use crate::error::{CalendarResult, Error};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key of the month last shown, as `YYYY-MM`
pub const VIEW_MONTH: &str = "view.month";
/// Key of the selected day, as `YYYY-MM-DD`
pub const VIEW_SELECTED: &str = "view.selected";

/// Small string store for state kept between runs
///
/// `open` loads the store, `flush` writes pending changes back. Nothing is
/// written before `flush`.
pub trait KeyValueStore: Sized {
    fn open(path: impl AsRef<Path>) -> CalendarResult<Self>;
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &str, value: impl Into<String>);
    fn remove(&mut self, key: &str) -> Option<String>;
    fn flush(&mut self) -> CalendarResult<()>;
}

/// [`KeyValueStore`] kept in a TOML file
#[derive(Debug)]
pub struct TomlStateStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
    dirty: bool,
}

impl TomlStateStore {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for TomlStateStore {
    fn open(path: impl AsRef<Path>) -> CalendarResult<Self> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| {
                Error::Serialization(format!("Invalid state file {}: {}", path.display(), e))
            })?
        } else {
            debug!("No state file at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_string(), value);
            self.dirty = true;
        }
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    fn flush(&mut self) -> CalendarResult<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, toml::to_string(&self.values)?)?;
        self.dirty = false;

        debug!("Saved view state to {}", self.path.display());
        Ok(())
    }
}
