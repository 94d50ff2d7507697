//! Role and ownership based authorization.
//!
//! `authorize` is a pure function of the caller, the action's declared policy
//! and the id of the user record being acted on. Policies are plain data
//! attached to routes when they are registered.

use std::fmt;

use crate::contract::model::Role;
use crate::domain::token::Claims;

/// Authenticated caller identity, taken from verified token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Self {
            id: c.id,
            email: c.email,
            name: c.name,
            role: c.role,
        }
    }
}

/// Class of operation an action performs on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Read,
    Update,
    Delete,
}

/// Access requirements declared for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPolicy {
    pub name: &'static str,
    pub operation: Operation,
    /// Empty means any authenticated caller passes the role check.
    pub required_roles: &'static [Role],
}

impl ActionPolicy {
    pub const fn new(
        name: &'static str,
        operation: Operation,
        required_roles: &'static [Role],
    ) -> Self {
        Self {
            name,
            operation,
            required_roles,
        }
    }
}

pub const LIST_USERS: ActionPolicy = ActionPolicy::new("list_users", Operation::List, &[Role::Admin]);
pub const GET_USER: ActionPolicy = ActionPolicy::new("get_user", Operation::Read, &[]);
/// Owner or admin. Only the target record is checked: payload fields,
/// `role` included, are not gated, so an owner may change their own role.
pub const UPDATE_USER: ActionPolicy = ActionPolicy::new("update_user", Operation::Update, &[]);
pub const DELETE_USER: ActionPolicy =
    ActionPolicy::new("delete_user", Operation::Delete, &[Role::Admin]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Caller's role is not among the action's required roles.
    WrongRole,
    /// USER acting on a record other than their own.
    NotOwner,
    /// USER attempting an operation class reserved for admins.
    OperationNotPermitted,
    /// ADMIN attempting to delete their own account.
    SelfDeletion,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::WrongRole => "wrong_role",
            DenyReason::NotOwner => "not_owner",
            DenyReason::OperationNotPermitted => "operation_not_permitted",
            DenyReason::SelfDeletion => "self_deletion",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DenyReason::WrongRole => "your role does not allow this action",
            DenyReason::NotOwner => "you can only access your own account",
            DenyReason::OperationNotPermitted => "this operation is not permitted for your role",
            DenyReason::SelfDeletion => "administrators cannot delete their own account",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether `principal` may perform `policy` on the record owned by `owner`.
///
/// `owner` is `None` for collection-level actions.
pub fn authorize(principal: &Principal, policy: &ActionPolicy, owner: Option<i32>) -> Decision {
    if !policy.required_roles.is_empty() && !policy.required_roles.contains(&principal.role) {
        return Decision::Deny(DenyReason::WrongRole);
    }

    match principal.role {
        Role::User => match policy.operation {
            Operation::Read | Operation::Update => {
                if owner == Some(principal.id) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NotOwner)
                }
            }
            Operation::List | Operation::Delete => {
                Decision::Deny(DenyReason::OperationNotPermitted)
            }
        },
        Role::Admin => match policy.operation {
            Operation::Delete if owner == Some(principal.id) => {
                Decision::Deny(DenyReason::SelfDeletion)
            }
            _ => Decision::Allow,
        },
    }
}
