//! Optional TOML configuration file.
//!
//! The file holds one table per command, keyed by command name:
//!
//! ```toml
//! [acl]
//! dgraph = "alpha-1:9080,alpha-2:9080"
//! tls-on = true
//!
//! [group-modify-permission]
//! group = "dev"
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Project directory name under the platform config dir.
const PROJECT_NAME: &str = "dgacl";

/// Config file name inside the project directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// A parsed configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    path: Option<PathBuf>,
    root: toml::Table,
}

impl ConfigFile {
    /// A file with no tables; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Default location: `<config dir>/dgacl/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(PROJECT_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the configuration file.
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// it exists; otherwise an empty configuration is returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config(format!(
                        "Config file does not exist at {}",
                        path.display()
                    )));
                }
                Self::from_path(path)
            }
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_path(&path),
                _ => Ok(Self::empty()),
            },
        }
    }

    /// Read and parse the file at `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let root: toml::Table = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(Self {
            path: Some(path.to_path_buf()),
            root,
        })
    }

    /// Parse configuration from a string (no backing path).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let root: toml::Table = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {e}")))?;
        Ok(Self { path: None, root })
    }

    /// Where this configuration was read from, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up `key` in the `[command]` table, stringifying scalars.
    ///
    /// Arrays are joined with `,` so endpoint lists may be written either way.
    pub fn lookup(&self, command: &str, key: &str) -> Result<Option<String>> {
        let Some(table) = self.root.get(command) else {
            return Ok(None);
        };
        let table = table.as_table().ok_or_else(|| {
            Error::config(format!("Config section [{command}] must be a table"))
        })?;
        table
            .get(key)
            .map(|value| scalar_to_string(value, command, key))
            .transpose()
    }
}

fn scalar_to_string(value: &toml::Value, command: &str, key: &str) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| scalar_to_string(item, command, key))
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.join(",")),
        _ => Err(Error::config(format!(
            "Unsupported value for {command}.{key}: expected string, integer, bool or array"
        ))),
    }
}
