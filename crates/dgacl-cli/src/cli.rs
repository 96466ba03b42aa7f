//! Command-line surface.
//!
//! Flags are declared as `Option`s with no clap defaults: only values the
//! user actually typed become [`ExplicitFlags`], so the environment and the
//! config file can fill everything else.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use dgacl_core::ExplicitFlags;
use dgacl_core::config::keys as base_keys;

use crate::verb::{Verb, keys};

// ============================================================================
// Top level
// ============================================================================

/// Administer users, groups and predicate permissions of a cluster.
#[derive(Parser, Debug, Clone)]
#[command(name = "dgacl", author, version, about, long_about = None)]
pub struct Cli {
    /// Connection and logging options shared by every verb
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The verb to run
    #[command(subcommand)]
    pub command: VerbCommand,
}

impl Cli {
    /// The selected verb.
    pub fn verb(&self) -> Verb {
        self.command.verb()
    }

    /// Every flag the user typed, global and verb-specific.
    pub fn explicit_flags(&self) -> ExplicitFlags {
        let mut flags = self.global.explicit_flags();
        flags.extend(self.command.explicit_flags());
        flags
    }
}

/// Options accepted before or after the verb.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Cluster endpoints, comma separated [default: 127.0.0.1:9080]
    #[arg(short = 'd', long, global = true, value_name = "HOST:PORT,...")]
    pub dgraph: Option<String>,

    /// Use TLS for cluster connections
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub tls_on: Option<bool>,

    /// CA certificates file (PEM)
    #[arg(long, global = true, value_name = "FILE")]
    pub tls_ca_certs: Option<String>,

    /// Client certificate file (PEM)
    #[arg(long, global = true, value_name = "FILE")]
    pub tls_cert: Option<String>,

    /// Client private key file (PEM)
    #[arg(long, global = true, value_name = "FILE")]
    pub tls_cert_key: Option<String>,

    /// Also trust the bundled web PKI roots
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub tls_use_system_ca: Option<bool>,

    /// Server name to verify instead of the endpoint host
    #[arg(long, global = true, value_name = "NAME")]
    pub tls_server_name: Option<String>,

    /// Configuration file path
    #[arg(long, global = true, env = "DGACL_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Connection flags the user typed.
    pub fn explicit_flags(&self) -> ExplicitFlags {
        let mut flags = ExplicitFlags::new();
        flags.insert_opt(base_keys::DGRAPH, self.dgraph.as_ref());
        flags.insert_opt(base_keys::TLS_ON, self.tls_on);
        flags.insert_opt(base_keys::TLS_CA_CERTS, self.tls_ca_certs.as_ref());
        flags.insert_opt(base_keys::TLS_CERT, self.tls_cert.as_ref());
        flags.insert_opt(base_keys::TLS_CERT_KEY, self.tls_cert_key.as_ref());
        flags.insert_opt(base_keys::TLS_USE_SYSTEM_CA, self.tls_use_system_ca);
        flags.insert_opt(base_keys::TLS_SERVER_NAME, self.tls_server_name.as_ref());
        flags
    }
}

// ============================================================================
// Verbs
// ============================================================================

/// One of the seven administrative verbs.
#[derive(Subcommand, Debug, Clone)]
pub enum VerbCommand {
    /// Create a user
    #[command(visible_alias = "useradd")]
    UserAdd(CredentialArgs),

    /// Delete a user
    #[command(visible_alias = "userdel")]
    UserDelete(UserArgs),

    /// Log in and print the access token
    Login(CredentialArgs),

    /// Create a group
    #[command(visible_alias = "groupadd")]
    GroupAdd(GroupArgs),

    /// Delete a group
    #[command(visible_alias = "groupdel")]
    GroupDelete(GroupArgs),

    /// Replace the groups a user belongs to
    #[command(visible_alias = "usermod")]
    UserModifyGroups(UserGroupsArgs),

    /// Set a group's permission on a predicate
    #[command(visible_alias = "chmod")]
    GroupModifyPermission(PermissionArgs),
}

impl VerbCommand {
    /// The verb this command selects.
    pub fn verb(&self) -> Verb {
        match self {
            VerbCommand::UserAdd(_) => Verb::UserAdd,
            VerbCommand::UserDelete(_) => Verb::UserDelete,
            VerbCommand::Login(_) => Verb::Login,
            VerbCommand::GroupAdd(_) => Verb::GroupAdd,
            VerbCommand::GroupDelete(_) => Verb::GroupDelete,
            VerbCommand::UserModifyGroups(_) => Verb::UserModifyGroups,
            VerbCommand::GroupModifyPermission(_) => Verb::GroupModifyPermission,
        }
    }

    /// Verb flags the user typed.
    pub fn explicit_flags(&self) -> ExplicitFlags {
        let mut flags = ExplicitFlags::new();
        match self {
            VerbCommand::UserAdd(args) | VerbCommand::Login(args) => {
                flags.insert_opt(keys::USER, args.user.as_ref());
                flags.insert_opt(keys::PASSWORD, args.password.as_ref());
            }
            VerbCommand::UserDelete(args) => {
                flags.insert_opt(keys::USER, args.user.as_ref());
            }
            VerbCommand::GroupAdd(args) | VerbCommand::GroupDelete(args) => {
                flags.insert_opt(keys::GROUP, args.group.as_ref());
            }
            VerbCommand::UserModifyGroups(args) => {
                flags.insert_opt(keys::USER, args.user.as_ref());
                flags.insert_opt(keys::GROUPS, args.groups.as_ref());
            }
            VerbCommand::GroupModifyPermission(args) => {
                flags.insert_opt(keys::GROUP, args.group.as_ref());
                flags.insert_opt(keys::PREDICATE, args.predicate.as_ref());
                flags.insert_opt(keys::PERMISSION, args.permission.as_ref());
            }
        }
        flags
    }
}

/// `--user` and `--password`.
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// User id
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password
    #[arg(short, long)]
    pub password: Option<String>,
}

/// `--user`.
#[derive(Args, Debug, Clone, Default)]
pub struct UserArgs {
    /// User id
    #[arg(short, long)]
    pub user: Option<String>,
}

/// `--group`.
#[derive(Args, Debug, Clone, Default)]
pub struct GroupArgs {
    /// Group id
    #[arg(short, long)]
    pub group: Option<String>,
}

/// `--user` and `--groups`.
#[derive(Args, Debug, Clone, Default)]
pub struct UserGroupsArgs {
    /// User id
    #[arg(short, long)]
    pub user: Option<String>,

    /// New group list, comma separated; replaces the current membership
    #[arg(short, long)]
    pub groups: Option<String>,
}

/// `--group`, `--predicate` and `--permission`.
#[derive(Args, Debug, Clone, Default)]
pub struct PermissionArgs {
    /// Group id
    #[arg(short, long)]
    pub group: Option<String>,

    /// Predicate name
    #[arg(short, long, visible_alias = "pred")]
    pub predicate: Option<String>,

    /// Permission: 0-7 (4 read, 2 write, 1 modify) or a form like rw-
    #[arg(short = 'P', long, visible_alias = "perm", allow_negative_numbers = true)]
    pub permission: Option<String>,
}
