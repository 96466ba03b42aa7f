//! The seven ACL verbs and their parameters.

use std::fmt;

use dgacl_core::config::PARENT_SETTINGS;
use dgacl_core::{BaseConfig, CommandSpec, Permission, ResolvedSettings, SettingSpec};

/// Name of the parent command; also the `[acl]` config-file table.
pub const PARENT_COMMAND: &str = "acl";

/// Environment prefix shared by every verb.
pub const ENV_PREFIX: &str = "DGACL";

/// Setting names owned by the verbs.
pub mod keys {
    /// User id.
    pub const USER: &str = "user";
    /// Password.
    pub const PASSWORD: &str = "password";
    /// Group id.
    pub const GROUP: &str = "group";
    /// Comma-separated group list.
    pub const GROUPS: &str = "groups";
    /// Predicate name.
    pub const PREDICATE: &str = "predicate";
    /// Permission, integer or symbolic.
    pub const PERMISSION: &str = "permission";
}

const USER: SettingSpec = SettingSpec::required(keys::USER);
const PASSWORD: SettingSpec = SettingSpec::required(keys::PASSWORD).verbatim();
const GROUP: SettingSpec = SettingSpec::required(keys::GROUP);
const GROUPS: SettingSpec = SettingSpec::required(keys::GROUPS);
const PREDICATE: SettingSpec = SettingSpec::required(keys::PREDICATE);
const PERMISSION: SettingSpec = SettingSpec::required(keys::PERMISSION);

const USER_ADD: &[SettingSpec] = &[USER, PASSWORD];
const USER_DELETE: &[SettingSpec] = &[USER];
const LOGIN: &[SettingSpec] = &[USER, PASSWORD];
const GROUP_ADD: &[SettingSpec] = &[GROUP];
const GROUP_DELETE: &[SettingSpec] = &[GROUP];
const USER_MODIFY_GROUPS: &[SettingSpec] = &[USER, GROUPS];
const GROUP_MODIFY_PERMISSION: &[SettingSpec] = &[GROUP, PREDICATE, PERMISSION];

/// An administrative verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Create a user.
    UserAdd,
    /// Delete a user.
    UserDelete,
    /// Log in and print the access token.
    Login,
    /// Create a group.
    GroupAdd,
    /// Delete a group.
    GroupDelete,
    /// Replace a user's groups.
    UserModifyGroups,
    /// Set a group's permission on a predicate.
    GroupModifyPermission,
}

impl Verb {
    /// Every verb, in help order.
    pub const ALL: [Verb; 7] = [
        Verb::UserAdd,
        Verb::UserDelete,
        Verb::Login,
        Verb::GroupAdd,
        Verb::GroupDelete,
        Verb::UserModifyGroups,
        Verb::GroupModifyPermission,
    ];

    /// Command name, also its config-file table.
    pub fn name(self) -> &'static str {
        match self {
            Verb::UserAdd => "user-add",
            Verb::UserDelete => "user-delete",
            Verb::Login => "login",
            Verb::GroupAdd => "group-add",
            Verb::GroupDelete => "group-delete",
            Verb::UserModifyGroups => "user-modify-groups",
            Verb::GroupModifyPermission => "group-modify-permission",
        }
    }

    /// Short alias, if the verb has one.
    pub fn alias(self) -> Option<&'static str> {
        match self {
            Verb::UserAdd => Some("useradd"),
            Verb::UserDelete => Some("userdel"),
            Verb::Login => None,
            Verb::GroupAdd => Some("groupadd"),
            Verb::GroupDelete => Some("groupdel"),
            Verb::UserModifyGroups => Some("usermod"),
            Verb::GroupModifyPermission => Some("chmod"),
        }
    }

    /// `DGACL_<VERB>`, e.g. `DGACL_USER_ADD`.
    pub fn env_prefix(self) -> String {
        format!("{ENV_PREFIX}_{}", self.name())
            .to_ascii_uppercase()
            .replace('-', "_")
    }

    /// Settings this verb declares.
    pub fn settings(self) -> &'static [SettingSpec] {
        match self {
            Verb::UserAdd => USER_ADD,
            Verb::UserDelete => USER_DELETE,
            Verb::Login => LOGIN,
            Verb::GroupAdd => GROUP_ADD,
            Verb::GroupDelete => GROUP_DELETE,
            Verb::UserModifyGroups => USER_MODIFY_GROUPS,
            Verb::GroupModifyPermission => GROUP_MODIFY_PERMISSION,
        }
    }

    /// Resolver declaration for this verb.
    pub fn spec(self) -> CommandSpec {
        CommandSpec::new(self.name(), self.env_prefix(), self.settings())
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolver declaration for the parent command.
pub fn parent_spec() -> CommandSpec {
    CommandSpec::parent(PARENT_COMMAND, PARENT_SETTINGS)
}

/// Split, trim and de-duplicate a comma-separated group list, keeping the
/// first occurrence of each name.
pub fn parse_groups(raw: &str) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for g in raw.split(',').map(str::trim).filter(|g| !g.is_empty()) {
        if !groups.iter().any(|seen| seen == g) {
            groups.push(g.to_string());
        }
    }
    groups
}

/// Verb-specific parameters, validated.
#[derive(Clone, PartialEq, Eq)]
pub enum VerbParams {
    /// `user-add`
    UserAdd {
        /// User id
        user: String,
        /// Initial password
        password: String,
    },
    /// `user-delete`
    UserDelete {
        /// User id
        user: String,
    },
    /// `login`
    Login {
        /// User id
        user: String,
        /// Password
        password: String,
    },
    /// `group-add`
    GroupAdd {
        /// Group id
        group: String,
    },
    /// `group-delete`
    GroupDelete {
        /// Group id
        group: String,
    },
    /// `user-modify-groups`
    UserModifyGroups {
        /// User id
        user: String,
        /// New membership, de-duplicated
        groups: Vec<String>,
    },
    /// `group-modify-permission`
    GroupModifyPermission {
        /// Group id
        group: String,
        /// Predicate name
        predicate: String,
        /// Validated permission
        permission: Permission,
    },
}

impl VerbParams {
    /// Typed parameters for `verb` from its resolved settings.
    pub fn from_resolved(verb: Verb, settings: &ResolvedSettings) -> dgacl_core::Result<Self> {
        let text = |name: &str| settings.require(name).map(str::to_string);
        // Passwords are sent verbatim; only an empty value is missing.
        let secret = |name: &str| {
            settings
                .get(name)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| dgacl_core::Error::missing_required(settings.command(), name))
        };
        let params = match verb {
            Verb::UserAdd => VerbParams::UserAdd {
                user: text(keys::USER)?,
                password: secret(keys::PASSWORD)?,
            },
            Verb::UserDelete => VerbParams::UserDelete {
                user: text(keys::USER)?,
            },
            Verb::Login => VerbParams::Login {
                user: text(keys::USER)?,
                password: secret(keys::PASSWORD)?,
            },
            Verb::GroupAdd => VerbParams::GroupAdd {
                group: text(keys::GROUP)?,
            },
            Verb::GroupDelete => VerbParams::GroupDelete {
                group: text(keys::GROUP)?,
            },
            Verb::UserModifyGroups => {
                let groups = parse_groups(settings.require(keys::GROUPS)?);
                if groups.is_empty() {
                    return Err(dgacl_core::Error::missing_required(
                        verb.name(),
                        keys::GROUPS,
                    ));
                }
                VerbParams::UserModifyGroups {
                    user: text(keys::USER)?,
                    groups,
                }
            }
            Verb::GroupModifyPermission => VerbParams::GroupModifyPermission {
                group: text(keys::GROUP)?,
                predicate: text(keys::PREDICATE)?,
                permission: settings.require(keys::PERMISSION)?.parse()?,
            },
        };
        Ok(params)
    }

    /// The verb these parameters belong to.
    pub fn verb(&self) -> Verb {
        match self {
            VerbParams::UserAdd { .. } => Verb::UserAdd,
            VerbParams::UserDelete { .. } => Verb::UserDelete,
            VerbParams::Login { .. } => Verb::Login,
            VerbParams::GroupAdd { .. } => Verb::GroupAdd,
            VerbParams::GroupDelete { .. } => Verb::GroupDelete,
            VerbParams::UserModifyGroups { .. } => Verb::UserModifyGroups,
            VerbParams::GroupModifyPermission { .. } => Verb::GroupModifyPermission,
        }
    }
}

// Passwords never reach logs.
impl fmt::Debug for VerbParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbParams::UserAdd { user, .. } | VerbParams::Login { user, .. } => f
                .debug_struct(self.verb().name())
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            VerbParams::UserDelete { user } => f
                .debug_struct(self.verb().name())
                .field("user", user)
                .finish(),
            VerbParams::GroupAdd { group } | VerbParams::GroupDelete { group } => f
                .debug_struct(self.verb().name())
                .field("group", group)
                .finish(),
            VerbParams::UserModifyGroups { user, groups } => f
                .debug_struct(self.verb().name())
                .field("user", user)
                .field("groups", groups)
                .finish(),
            VerbParams::GroupModifyPermission {
                group,
                predicate,
                permission,
            } => f
                .debug_struct(self.verb().name())
                .field("group", group)
                .field("predicate", predicate)
                .field("permission", &permission.to_string())
                .finish(),
        }
    }
}

/// Everything one invocation needs: where to connect and what to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    /// Endpoints and TLS policy.
    pub base: BaseConfig,
    /// Verb parameters.
    pub params: VerbParams,
}

impl EffectiveConfig {
    /// Build from the settings resolved for `verb`.
    pub fn from_resolved(verb: Verb, settings: &ResolvedSettings) -> dgacl_core::Result<Self> {
        Ok(Self {
            base: BaseConfig::from_resolved(settings)?,
            params: VerbParams::from_resolved(verb, settings)?,
        })
    }
}
