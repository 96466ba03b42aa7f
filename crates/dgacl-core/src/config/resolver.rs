//! Precedence-based setting resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::config::env::EnvSource;
use crate::config::file::ConfigFile;
use crate::config::spec::CommandSpec;
use crate::error::{Error, Result};

/// Values the user typed on the command line, keyed by setting name.
///
/// Only flags that were actually given belong here; clap defaults must not
/// be inserted or they would shadow the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitFlags(BTreeMap<String, String>);

impl ExplicitFlags {
    /// No explicit flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a flag value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Record a flag value if it was given.
    pub fn insert_opt<V: ToString>(&mut self, name: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(name, value.to_string());
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Merge another set; entries in `other` win.
    pub fn extend(&mut self, other: ExplicitFlags) {
        self.0.extend(other.0);
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Which layer supplied a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Source {
    /// Explicit command-line flag.
    Flag,
    /// Environment variable.
    Env,
    /// Config file, command table.
    CommandFile,
    /// Config file, parent table.
    ParentFile,
    /// Command-specific default.
    CommandDefault,
    /// Inherited parent default.
    ParentDefault,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => write!(f, "flag"),
            Self::Env => write!(f, "env"),
            Self::CommandFile => write!(f, "config file (command)"),
            Self::ParentFile => write!(f, "config file (parent)"),
            Self::CommandDefault => write!(f, "command default"),
            Self::ParentDefault => write!(f, "parent default"),
        }
    }
}

/// A resolved value and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// The raw string value.
    pub value: String,
    /// The winning layer.
    pub source: Source,
}

/// Output of [`Resolver::resolve`]: one entry per setting that resolved to
/// something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    command: String,
    values: BTreeMap<String, ResolvedValue>,
}

impl ResolvedSettings {
    /// Name of the command these settings belong to.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Raw value of a setting.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| v.value.as_str())
    }

    /// Which layer supplied a setting.
    pub fn source(&self, name: &str) -> Option<Source> {
        self.values.get(name).map(|v| v.source)
    }

    /// Raw value of a setting, treating blank as absent.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Non-empty value of a setting or [`Error::MissingRequired`].
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get_non_empty(name)
            .ok_or_else(|| Error::missing_required(&self.command, name))
    }

    /// Boolean value; absent or blank is `false`.
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.get_non_empty(name) {
            None => Ok(false),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                other => Err(Error::invalid_value(
                    name,
                    format!("expected true or false, got '{other}'"),
                )),
            },
        }
    }

    /// Integer value, if present.
    pub fn get_i64(&self, name: &str) -> Result<Option<i64>> {
        self.get_non_empty(name)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|e| Error::invalid_value(name, format!("'{v}' is not an integer: {e}")))
            })
            .transpose()
    }

    /// Path value, if present.
    pub fn get_path(&self, name: &str) -> Option<PathBuf> {
        self.get_non_empty(name).map(PathBuf::from)
    }
}

/// Merges flags, environment, config file and defaults for one command.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    parent: &'a CommandSpec,
    command: &'a CommandSpec,
}

impl<'a> Resolver<'a> {
    /// Resolve `command`'s settings plus those inherited from `parent`.
    pub fn new(parent: &'a CommandSpec, command: &'a CommandSpec) -> Self {
        Self { parent, command }
    }

    /// Produce the resolved setting set.
    ///
    /// Fails with [`Error::MissingRequired`] for the first mandatory setting
    /// (parent settings first, then the command's) that resolves empty.
    pub fn resolve<E: EnvSource>(
        &self,
        flags: &ExplicitFlags,
        env: &E,
        file: &ConfigFile,
    ) -> Result<ResolvedSettings> {
        let mut values = BTreeMap::new();

        let specs = self
            .parent
            .settings
            .iter()
            .map(|s| (s, true))
            .chain(self.command.settings.iter().map(|s| (s, false)));

        for (spec, inherited) in specs {
            let resolved = self.resolve_one(spec.name, inherited, flags, env, file)?;
            let empty = resolved.as_ref().is_none_or(|r| spec.is_blank(&r.value));
            if spec.required && empty {
                return Err(Error::missing_required(self.command.name, spec.name));
            }
            if let Some(resolved) = resolved {
                tracing::trace!(
                    command = self.command.name,
                    setting = spec.name,
                    source = %resolved.source,
                    "resolved setting"
                );
                values.insert(spec.name.to_string(), resolved);
            }
        }

        Ok(ResolvedSettings {
            command: self.command.name.to_string(),
            values,
        })
    }

    fn resolve_one<E: EnvSource>(
        &self,
        name: &str,
        inherited: bool,
        flags: &ExplicitFlags,
        env: &E,
        file: &ConfigFile,
    ) -> Result<Option<ResolvedValue>> {
        let found = |value: String, source| Ok(Some(ResolvedValue { value, source }));

        if let Some(v) = flags.get(name) {
            return found(v.to_string(), Source::Flag);
        }
        if let Some(v) = self
            .command
            .env_var(name)
            .and_then(|key| env.var(&key))
            .filter(|v| !v.is_empty())
        {
            return found(v, Source::Env);
        }
        if let Some(v) = file.lookup(self.command.name, name)? {
            return found(v, Source::CommandFile);
        }
        if let Some(v) = file.lookup(self.parent.name, name)? {
            return found(v, Source::ParentFile);
        }
        if let Some(v) = self.command.command_default(name) {
            return found(v.to_string(), Source::CommandDefault);
        }
        if inherited {
            if let Some(v) = self.parent.setting(name).and_then(|s| s.default) {
                return found(v.to_string(), Source::ParentDefault);
            }
        }
        Ok(None)
    }
}
