//! Configuration management
//!
//! Each instance keeps its settings in a flat TOML table. The rest of the
//! application reads them through the string-keyed [`ConfigStore`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Config key {key} is not a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Home directory not found")]
    NoHomeDir,
}

/// All settings of one instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tab strip position: 0 top, 1 bottom, 2 left, 3 right
    pub tab_pos: i64,
    pub notebook_border: bool,
    /// Global key that pulls the window up and down
    pub key: String,
    /// Show on all workspaces
    ///
    /// The GTK4 front end cannot request this; it is left to the window
    /// manager, as are `above`, `x_pos` and `y_pos`.
    pub pinned: bool,
    /// Keep above other windows (window manager decides under GTK4)
    pub above: bool,
    /// Window position; GTK4 leaves placement to the window manager
    pub x_pos: i64,
    pub y_pos: i64,
    pub max_width: i64,
    pub max_height: i64,
    /// Start hidden instead of pulled down
    pub hidden: bool,
    /// Window and tab title
    pub title: String,
    pub command: String,
    /// Run `command` instead of the shell
    pub run_command: bool,
    pub working_dir: String,
    /// Scrollback lines
    pub lines: i64,
    pub font: String,
    pub enable_transparency: bool,
    /// Transparency in percent
    pub transparency: i64,
    /// Slide the window instead of showing it at once
    pub animation: bool,
    pub slide_sleep_usec: i64,
    pub decorated: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tab_pos: 0,
            notebook_border: false,
            key: "F1".into(),
            pinned: true,
            above: true,
            x_pos: 0,
            y_pos: 0,
            max_width: 600,
            max_height: 150,
            hidden: false,
            title: "Tilda".into(),
            command: String::new(),
            run_command: false,
            working_dir: String::new(),
            lines: 1000,
            font: "Monospace 11".into(),
            enable_transparency: false,
            transparency: 0,
            animation: false,
            slide_sleep_usec: 15000,
            decorated: false,
        }
    }
}

/// A borrowed config value
#[derive(Debug, Clone, Copy, PartialEq)]
enum Value<'a> {
    Int(i64),
    Bool(bool),
    Str(&'a str),
}

enum ValueMut<'a> {
    Int(&'a mut i64),
    Bool(&'a mut bool),
    Str(&'a mut String),
}

impl Config {
    fn value(&self, key: &str) -> Option<Value<'_>> {
        Some(match key {
            "tab_pos" => Value::Int(self.tab_pos),
            "notebook_border" => Value::Bool(self.notebook_border),
            "key" => Value::Str(&self.key),
            "pinned" => Value::Bool(self.pinned),
            "above" => Value::Bool(self.above),
            "x_pos" => Value::Int(self.x_pos),
            "y_pos" => Value::Int(self.y_pos),
            "max_width" => Value::Int(self.max_width),
            "max_height" => Value::Int(self.max_height),
            "hidden" => Value::Bool(self.hidden),
            "title" => Value::Str(&self.title),
            "command" => Value::Str(&self.command),
            "run_command" => Value::Bool(self.run_command),
            "working_dir" => Value::Str(&self.working_dir),
            "lines" => Value::Int(self.lines),
            "font" => Value::Str(&self.font),
            "enable_transparency" => Value::Bool(self.enable_transparency),
            "transparency" => Value::Int(self.transparency),
            "animation" => Value::Bool(self.animation),
            "slide_sleep_usec" => Value::Int(self.slide_sleep_usec),
            "decorated" => Value::Bool(self.decorated),
            _ => return None,
        })
    }

    fn value_mut(&mut self, key: &str) -> Option<ValueMut<'_>> {
        Some(match key {
            "tab_pos" => ValueMut::Int(&mut self.tab_pos),
            "notebook_border" => ValueMut::Bool(&mut self.notebook_border),
            "key" => ValueMut::Str(&mut self.key),
            "pinned" => ValueMut::Bool(&mut self.pinned),
            "above" => ValueMut::Bool(&mut self.above),
            "x_pos" => ValueMut::Int(&mut self.x_pos),
            "y_pos" => ValueMut::Int(&mut self.y_pos),
            "max_width" => ValueMut::Int(&mut self.max_width),
            "max_height" => ValueMut::Int(&mut self.max_height),
            "hidden" => ValueMut::Bool(&mut self.hidden),
            "title" => ValueMut::Str(&mut self.title),
            "command" => ValueMut::Str(&mut self.command),
            "run_command" => ValueMut::Bool(&mut self.run_command),
            "working_dir" => ValueMut::Str(&mut self.working_dir),
            "lines" => ValueMut::Int(&mut self.lines),
            "font" => ValueMut::Str(&mut self.font),
            "enable_transparency" => ValueMut::Bool(&mut self.enable_transparency),
            "transparency" => ValueMut::Int(&mut self.transparency),
            "animation" => ValueMut::Bool(&mut self.animation),
            "slide_sleep_usec" => ValueMut::Int(&mut self.slide_sleep_usec),
            "decorated" => ValueMut::Bool(&mut self.decorated),
            _ => return None,
        })
    }
}

/// String-keyed config store bound to one instance's file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Load the store from `path`; a missing file yields the defaults
    pub fn init(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();

        let config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            log::info!("No config at {}, using defaults", path.display());
            Config::default()
        };

        Ok(Self { path, config })
    }

    /// Wrap an in-memory config (nothing is read until [`save`](Self::save))
    pub fn with_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Typed view of every setting
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        match self.lookup(key)? {
            Value::Int(v) => Ok(v),
            _ => Err(wrong_type(key, "integer")),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        match self.lookup(key)? {
            Value::Bool(v) => Ok(v),
            _ => Err(wrong_type(key, "boolean")),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ConfigError> {
        match self.lookup(key)? {
            Value::Str(v) => Ok(v),
            _ => Err(wrong_type(key, "string")),
        }
    }

    pub fn set_int(&mut self, key: &str, value: i64) -> Result<(), ConfigError> {
        match self.lookup_mut(key)? {
            ValueMut::Int(slot) => *slot = value,
            _ => return Err(wrong_type(key, "integer")),
        }
        Ok(())
    }

    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<(), ConfigError> {
        match self.lookup_mut(key)? {
            ValueMut::Bool(slot) => *slot = value,
            _ => return Err(wrong_type(key, "boolean")),
        }
        Ok(())
    }

    pub fn set_str(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match self.lookup_mut(key)? {
            ValueMut::Str(slot) => *slot = value.to_string(),
            _ => return Err(wrong_type(key, "string")),
        }
        Ok(())
    }

    /// Write the store back to its file
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(&self.config)?;
        std::fs::write(&self.path, &content)?;

        // Set restrictive permissions on config file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }

        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<Value<'_>, ConfigError> {
        self.config
            .value(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
    }

    fn lookup_mut(&mut self, key: &str) -> Result<ValueMut<'_>, ConfigError> {
        self.config
            .value_mut(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
    }
}

fn wrong_type(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::WrongType {
        key: key.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tab_pos, 0);
        assert_eq!(config.key, "F1");
        assert!(!config.hidden);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::init(dir.path().join("config_0")).unwrap();
        assert_eq!(store.config(), &Config::default());
    }

    #[test]
    fn test_typed_getters() {
        let store = ConfigStore::with_config("unused", Config::default());
        assert_eq!(store.get_int("max_height").unwrap(), 150);
        assert!(store.get_bool("pinned").unwrap());
        assert_eq!(store.get_str("font").unwrap(), "Monospace 11");
    }

    #[test]
    fn test_unknown_key() {
        let store = ConfigStore::with_config("unused", Config::default());
        assert!(matches!(
            store.get_int("no_such_key"),
            Err(ConfigError::UnknownKey(k)) if k == "no_such_key"
        ));
    }

    #[test]
    fn test_wrong_type() {
        let mut store = ConfigStore::with_config("unused", Config::default());
        assert!(matches!(
            store.get_bool("tab_pos"),
            Err(ConfigError::WrongType { expected: "boolean", .. })
        ));
        assert!(store.set_str("hidden", "yes").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".tilda").join("config_3");

        let mut store = ConfigStore::init(&path).unwrap();
        store.set_int("tab_pos", 2).unwrap();
        store.set_bool("hidden", true).unwrap();
        store.set_str("key", "<Control>F12").unwrap();
        store.save().unwrap();

        let reloaded = ConfigStore::init(&path).unwrap();
        assert_eq!(reloaded.get_int("tab_pos").unwrap(), 2);
        assert!(reloaded.get_bool("hidden").unwrap());
        assert_eq!(reloaded.get_str("key").unwrap(), "<Control>F12");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config_0");
        std::fs::write(&path, "tab_pos = 7\nabove = false\n").unwrap();

        let store = ConfigStore::init(&path).unwrap();
        assert_eq!(store.get_int("tab_pos").unwrap(), 7);
        assert!(!store.get_bool("above").unwrap());
        assert_eq!(store.get_int("max_width").unwrap(), 600);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config_0");
        std::fs::write(&path, "tab_pos = \"top\"\n").unwrap();

        assert!(matches!(ConfigStore::init(&path), Err(ConfigError::Parse(_))));
    }
}
