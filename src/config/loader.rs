//! Layered configuration loading.
//!
//! A base file (`.json` or `.toml`) holds one section per config type,
//! keyed by the type's section name. Environment variables named after a
//! section and holding a JSON object are merged over the file, so the
//! environment wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::schema::{ClientConfig, ServerConfig};

/// Default base file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0} must contain a table of sections")]
    NotATable(PathBuf),

    #[error("environment variable {name} is not valid JSON: {source}")]
    Env {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("section {section} is invalid: {source}")]
    Section {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A typed sub-configuration stored under a fixed section name.
pub trait ConfigSection: Serialize + DeserializeOwned {
    const NAME: &'static str;
}

impl ConfigSection for ServerConfig {
    const NAME: &'static str = "ServerConfig";
}

impl ConfigSection for ClientConfig {
    const NAME: &'static str = "ClientConfig";
}

/// Merged view over the file and environment layers.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    sections: Map<String, Value>,
}

impl AppConfig {
    /// Load `config.json` from the working directory and the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(Path::new(DEFAULT_CONFIG_FILE), std::env::vars())
    }

    /// Load `path` and merge `env` over it. A missing file is an empty layer.
    pub fn from_sources<I>(path: &Path, env: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut sections = read_file(path)?;

        for (name, raw) in env {
            if !raw.trim_start().starts_with('{') {
                continue;
            }
            let overlay: Value =
                serde_json::from_str(&raw).map_err(|source| ConfigError::Env {
                    name: name.clone(),
                    source,
                })?;
            let entry = sections.entry(name).or_insert(Value::Null);
            merge_values(entry, overlay);
        }

        Ok(Self { sections })
    }

    /// Names of all known sections.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Overlay section `T::NAME` onto `dest`.
    ///
    /// Fields absent from the section keep their current value in `dest`.
    /// A missing section leaves `dest` untouched.
    pub fn value<T: ConfigSection>(&self, dest: &mut T) -> Result<(), ConfigError> {
        let Some(section) = self.sections.get(T::NAME) else {
            return Ok(());
        };

        let section_error = |source| ConfigError::Section {
            section: T::NAME,
            source,
        };
        let mut current = serde_json::to_value(&*dest).map_err(section_error)?;
        merge_values(&mut current, section.clone());
        *dest = serde_json::from_value(current).map_err(section_error)?;
        Ok(())
    }

    /// Section `T::NAME` on its own, if present.
    pub fn section<T: ConfigSection>(&self) -> Result<Option<T>, ConfigError> {
        self.sections
            .get(T::NAME)
            .map(|section| {
                serde_json::from_value(section.clone()).map_err(|source| ConfigError::Section {
                    section: T::NAME,
                    source,
                })
            })
            .transpose()
    }
}

fn read_file(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Config file not found, using environment only");
            return Ok(Map::new());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    let parsed: Value = if is_toml {
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?
    };

    match parsed {
        Value::Object(sections) => Ok(sections),
        _ => Err(ConfigError::NotATable(path.to_path_buf())),
    }
}

/// Deep-merge `overlay` into `base`. Objects merge key by key; anything
/// else replaces.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_values(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}
