//! Who may act on whose carriers.
//!
//! Anonymous actors are always refused. A student acts only on their own user id, whether it is
//! given implicitly, by id, or by username. Teachers and admins may act on behalf of any user
//! they name. Document administration belongs to admins and to the teacher owning the document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::types::actor::Actor;
use crate::types::carrier::TextKind;
use crate::types::errors::{CoreError, CoreResult};
use crate::types::identifiers::UserId;

/// The user whose carriers a call reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetUser {
    /// The actor themself.
    Actor,
    Id(UserId),
    Username(String),
}

impl From<UserId> for TargetUser {
    fn from(id: UserId) -> Self {
        TargetUser::Id(id)
    }
}

impl From<&str> for TargetUser {
    fn from(username: &str) -> Self {
        TargetUser::Username(username.to_owned())
    }
}

/// User-identity oracle.
pub trait UserDirectory {
    fn find_by_username(&self, username: &str) -> Option<UserId>;
}

impl UserDirectory for BTreeMap<String, UserId> {
    fn find_by_username(&self, username: &str) -> Option<UserId> {
        self.get(username).copied()
    }
}

pub fn resolve_target<D: UserDirectory + ?Sized>(
    actor: &Actor,
    target: &TargetUser,
    directory: &D,
) -> CoreResult<UserId> {
    let Some(me) = actor.user_id() else {
        return Err(CoreError::forbidden("anonymous actors cannot edit"));
    };

    match target {
        TargetUser::Actor => Ok(me),
        TargetUser::Id(id) if *id == me || actor.is_privileged() => Ok(*id),
        TargetUser::Id(id) => Err(CoreError::forbidden(format!("{me} cannot act for {id}"))),
        TargetUser::Username(name) => match directory.find_by_username(name) {
            Some(id) if id == me || actor.is_privileged() => Ok(id),
            Some(_) => Err(CoreError::forbidden(format!("{me} cannot act for {name:?}"))),
            None if actor.is_privileged() => {
                Err(CoreError::target_not_found(format!("user {name:?}")))
            }
            // A student learns nothing about which usernames exist.
            None => Err(CoreError::forbidden(format!("{me} cannot act for {name:?}"))),
        },
    }
}

pub fn require_privileged(actor: &Actor) -> CoreResult<UserId> {
    match actor.user_id() {
        Some(id) if actor.is_privileged() => Ok(id),
        _ => Err(CoreError::forbidden("teacher or admin role required")),
    }
}

/// Admins, and the teacher who owns `doc`.
pub fn require_document_manager(actor: &Actor, doc: &Document) -> CoreResult<UserId> {
    match actor.user_id() {
        Some(id) if actor.is_admin() || (actor.is_teacher() && id == doc.owner) => Ok(id),
        _ => Err(CoreError::forbidden(format!("only its teacher or an admin manages {}", doc.id))),
    }
}

/// Students cannot touch a reading once that kind has been validated on the document.
pub fn check_stage_gate(actor: &Actor, doc: &Document, kind: TextKind) -> CoreResult<()> {
    if !actor.is_privileged() && doc.stage.is_validated(kind) {
        return Err(CoreError::forbidden(format!(
            "the {kind} of {} is validated",
            doc.id
        )));
    }
    Ok(())
}
