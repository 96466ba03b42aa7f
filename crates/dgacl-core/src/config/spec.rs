//! Setting and command declarations.

/// One named setting a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingSpec {
    /// Long flag name, also the config-file key.
    pub name: &'static str,
    /// Default used when no other layer supplies a value.
    pub default: Option<&'static str>,
    /// Whether an empty resolved value is an error.
    pub required: bool,
    /// Value is used exactly as given. Surrounding whitespace is kept and
    /// only a zero-length value counts as empty.
    pub verbatim: bool,
}

impl SettingSpec {
    /// An optional setting with no default.
    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            required: false,
            verbatim: false,
        }
    }

    /// A mandatory setting with no default.
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            required: true,
            verbatim: false,
        }
    }

    /// Keep the value untrimmed.
    pub const fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    /// Whether `value` counts as unset for this setting.
    pub fn is_blank(&self, value: &str) -> bool {
        if self.verbatim {
            value.is_empty()
        } else {
            value.trim().is_empty()
        }
    }

    /// Attach a default value.
    pub const fn default_value(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }
}

/// The declared settings of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Command name, also the config-file table name.
    pub name: &'static str,
    /// Prefix for environment variables. `None` for the parent command,
    /// whose settings are read from the environment under each verb's
    /// prefix instead.
    pub env_prefix: Option<String>,
    /// Settings owned by this command.
    pub settings: &'static [SettingSpec],
    /// Command-specific defaults for settings inherited from the parent.
    pub default_overrides: &'static [(&'static str, &'static str)],
}

impl CommandSpec {
    /// Declare a command with its own settings.
    pub fn new(
        name: &'static str,
        env_prefix: impl Into<String>,
        settings: &'static [SettingSpec],
    ) -> Self {
        Self {
            name,
            env_prefix: Some(env_prefix.into()),
            settings,
            default_overrides: &[],
        }
    }

    /// Declare the parent command. It has no environment prefix of its own.
    pub fn parent(name: &'static str, settings: &'static [SettingSpec]) -> Self {
        Self {
            name,
            env_prefix: None,
            settings,
            default_overrides: &[],
        }
    }

    /// Override defaults of inherited parent settings.
    pub fn with_default_overrides(
        mut self,
        overrides: &'static [(&'static str, &'static str)],
    ) -> Self {
        self.default_overrides = overrides;
        self
    }

    /// Look up a setting owned by this command.
    pub fn setting(&self, name: &str) -> Option<&SettingSpec> {
        self.settings.iter().find(|s| s.name == name)
    }

    /// Environment variable name for one of this command's settings.
    pub fn env_var(&self, setting: &str) -> Option<String> {
        self.env_prefix
            .as_deref()
            .map(|prefix| env_var_name(prefix, setting))
    }

    fn default_override(&self, name: &str) -> Option<&'static str> {
        self.default_overrides
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// The command-level default for `name`: its own setting default, or an
    /// override of a parent setting.
    pub fn command_default(&self, name: &str) -> Option<&'static str> {
        self.setting(name)
            .and_then(|s| s.default)
            .or_else(|| self.default_override(name))
    }
}

/// Build `{PREFIX}_{NAME}` uppercased with `-` mapped to `_`.
pub fn env_var_name(prefix: &str, setting: &str) -> String {
    let name = format!("{prefix}_{setting}");
    name.to_ascii_uppercase().replace('-', "_")
}
