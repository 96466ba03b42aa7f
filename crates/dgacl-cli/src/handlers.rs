//! One handler per verb. Each issues exactly one transaction.

use dgacl_client::{AclMutation, LogicalClient, Result, TxnContext};
use tracing::{info, warn};

use crate::verb::{Verb, VerbParams};

/// What a successful verb reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The verb that ran
    pub verb: Verb,
    /// Line printed to stdout
    pub message: String,
    /// Transaction state, for verbs that mutate
    pub txn: Option<TxnContext>,
}

/// Run the handler for `params` against `client`.
pub async fn execute(client: &mut LogicalClient, params: &VerbParams) -> Result<Report> {
    match params {
        VerbParams::UserAdd { user, password } => user_add(client, user, password).await,
        VerbParams::UserDelete { user } => user_delete(client, user).await,
        VerbParams::Login { user, password } => login(client, user, password).await,
        VerbParams::GroupAdd { group } => group_add(client, group).await,
        VerbParams::GroupDelete { group } => group_delete(client, group).await,
        VerbParams::UserModifyGroups { user, groups } => {
            user_modify_groups(client, user, groups).await
        }
        VerbParams::GroupModifyPermission {
            group,
            predicate,
            permission,
        } => {
            group_modify_permission(client, group, predicate, permission.value()).await
        }
    }
}

async fn user_add(client: &mut LogicalClient, user: &str, password: &str) -> Result<Report> {
    let mutation = AclMutation::CreateUser {
        user: user.to_string(),
        password: password.to_string(),
    };
    let txn = commit_one(client, mutation).await?;
    Ok(report(Verb::UserAdd, format!("Created user {user}"), txn))
}

async fn user_delete(client: &mut LogicalClient, user: &str) -> Result<Report> {
    let mutation = AclMutation::DeleteUser {
        user: user.to_string(),
    };
    let txn = commit_one(client, mutation).await?;
    Ok(report(Verb::UserDelete, format!("Deleted user {user}"), txn))
}

async fn login(client: &mut LogicalClient, user: &str, password: &str) -> Result<Report> {
    let resp = client.login(user, password).await?;
    info!(user, "Logged in");
    Ok(Report {
        verb: Verb::Login,
        message: resp.access_jwt,
        txn: None,
    })
}

async fn group_add(client: &mut LogicalClient, group: &str) -> Result<Report> {
    let mutation = AclMutation::CreateGroup {
        group: group.to_string(),
    };
    let txn = commit_one(client, mutation).await?;
    Ok(report(Verb::GroupAdd, format!("Created group {group}"), txn))
}

async fn group_delete(client: &mut LogicalClient, group: &str) -> Result<Report> {
    let mutation = AclMutation::DeleteGroup {
        group: group.to_string(),
    };
    let txn = commit_one(client, mutation).await?;
    Ok(report(Verb::GroupDelete, format!("Deleted group {group}"), txn))
}

async fn user_modify_groups(
    client: &mut LogicalClient,
    user: &str,
    groups: &[String],
) -> Result<Report> {
    let mutation = AclMutation::SetUserGroups {
        user: user.to_string(),
        groups: groups.to_vec(),
    };
    let txn = commit_one(client, mutation).await?;
    Ok(report(
        Verb::UserModifyGroups,
        format!("Set groups of user {user} to {}", groups.join(",")),
        txn,
    ))
}

async fn group_modify_permission(
    client: &mut LogicalClient,
    group: &str,
    predicate: &str,
    permission: u8,
) -> Result<Report> {
    let mutation = AclMutation::SetGroupPermission {
        group: group.to_string(),
        predicate: predicate.to_string(),
        permission,
    };
    let txn = commit_one(client, mutation).await?;
    Ok(report(
        Verb::GroupModifyPermission,
        format!("Set permission of group {group} on predicate {predicate} to {permission}"),
        txn,
    ))
}

/// Stage `mutation` in a fresh transaction and commit it. A failed mutate
/// aborts the transaction before the error is returned.
async fn commit_one(client: &mut LogicalClient, mutation: AclMutation) -> Result<TxnContext> {
    let mut txn = client.new_txn();
    if let Err(e) = txn.mutate(mutation).await {
        if let Err(abort) = txn.discard().await {
            warn!(error = %abort, "Abort after failed mutation also failed");
        }
        return Err(e);
    }
    txn.commit().await
}

fn report(verb: Verb, message: String, txn: TxnContext) -> Report {
    info!(%verb, start_ts = txn.start_ts, "{message}");
    Report {
        verb,
        message,
        txn: Some(txn),
    }
}
