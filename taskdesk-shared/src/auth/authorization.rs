/// Authorization helpers and permission checks
///
/// This module is the decision layer between the HTTP handlers and the
/// membership store. Every check follows the same shape: resolve the
/// caller's role in the target organization from the database, then apply
/// a pure rule from [`Role`]. The role carried in the caller's token is
/// never consulted.
///
/// # Permission Model
///
/// 1. **Organization membership**: the caller must hold a membership row
///    in the target organization (absence means no access).
/// 2. **Role rules**: Owner > Admin > Viewer. Viewer is strictly
///    read-only; member management requires Admin or higher.
/// 3. **Self-protection**: a caller may never change their own role or
///    remove themselves, regardless of role. Prevents accidental lockout.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::auth::authorization::{require_org_access, require_task_mutation, TaskAction};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, org_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let role = require_org_access(&pool, user_id, org_id).await?;
/// require_task_mutation(role, TaskAction::Update)?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use crate::backfill;
use crate::models::membership::{Membership, Role};
use crate::models::task::Task;

/// Mutating task operation, named for error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Creating a new task
    Create,

    /// Updating an existing task
    Update,

    /// Deleting a task
    Delete,
}

impl TaskAction {
    /// Gets the action verb as used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Create => "create",
            TaskAction::Update => "update",
            TaskAction::Delete => "delete",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for authorization checks
///
/// The `Display` strings are the reason strings surfaced to callers in
/// Forbidden responses.
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller holds no membership in the target organization (task paths)
    #[error("no organization access")]
    NoOrgAccess { organization_id: Uuid },

    /// Caller holds no role in the organization (member/organization paths)
    #[error("no access")]
    NoAccess { organization_id: Uuid },

    /// Task belongs to an organization outside the caller's accessible set
    #[error("no task access")]
    NoTaskAccess { task_id: Uuid },

    /// Viewer attempted a mutating task operation
    #[error("viewers cannot {action} tasks")]
    ViewerReadOnly { action: TaskAction },

    /// Caller attempted to change their own role
    #[error("cannot change own role")]
    SelfRoleChange,

    /// Caller attempted to remove themselves from the organization
    #[error("cannot remove self")]
    SelfRemoval,

    /// Caller's role is below the required threshold
    #[error("requires {required} role or higher")]
    InsufficientRole { required: Role, actual: Role },

    /// Operation targets a user with no membership row
    #[error("not a member of this organization")]
    NotAMember {
        user_id: Uuid,
        organization_id: Uuid,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Resolves the caller's role for a task-scoped operation
///
/// Absence of a membership row means no access; no backfill is triggered
/// here (role lookups never mutate).
///
/// # Errors
///
/// Returns `AuthzError::NoOrgAccess` if the caller has no membership.
pub async fn require_org_access(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<Role, AuthzError> {
    Membership::get_role(pool, user_id, organization_id)
        .await?
        .ok_or(AuthzError::NoOrgAccess { organization_id })
}

/// Resolves the caller's role for an organization-scoped operation
///
/// Any role suffices (Viewer included); used for member listing and as
/// the first step of member management.
///
/// # Errors
///
/// Returns `AuthzError::NoAccess` if the caller has no membership.
pub async fn require_any_role(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<Role, AuthzError> {
    Membership::get_role(pool, user_id, organization_id)
        .await?
        .ok_or(AuthzError::NoAccess { organization_id })
}

/// Requires Admin or higher in the organization
///
/// Gate for renaming the organization and adding/removing members or
/// changing member roles.
///
/// # Errors
///
/// Returns `AuthzError::NoAccess` for non-members and
/// `AuthzError::InsufficientRole` for Viewers.
pub async fn require_member_management(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<Role, AuthzError> {
    let role = require_any_role(pool, user_id, organization_id).await?;

    if !role.is_at_least(Role::Admin) {
        return Err(AuthzError::InsufficientRole {
            required: Role::Admin,
            actual: role,
        });
    }

    Ok(role)
}

/// Checks that a role may perform a mutating task action
///
/// # Errors
///
/// Returns `AuthzError::ViewerReadOnly` for Viewers.
pub fn require_task_mutation(role: Role, action: TaskAction) -> Result<(), AuthzError> {
    if !role.can_mutate() {
        return Err(AuthzError::ViewerReadOnly { action });
    }

    Ok(())
}

/// Rejects role changes targeting the caller themselves
///
/// Hard rule, independent of the caller's role.
///
/// # Errors
///
/// Returns `AuthzError::SelfRoleChange` when `caller_id == target_id`.
pub fn forbid_self_role_change(caller_id: Uuid, target_id: Uuid) -> Result<(), AuthzError> {
    if caller_id == target_id {
        return Err(AuthzError::SelfRoleChange);
    }

    Ok(())
}

/// Rejects removal operations targeting the caller themselves
///
/// Hard rule, independent of the caller's role.
///
/// # Errors
///
/// Returns `AuthzError::SelfRemoval` when `caller_id == target_id`.
pub fn forbid_self_removal(caller_id: Uuid, target_id: Uuid) -> Result<(), AuthzError> {
    if caller_id == target_id {
        return Err(AuthzError::SelfRemoval);
    }

    Ok(())
}

/// Requires that the target user holds a membership row
///
/// Used before updating or removing a member: those operations are not
/// upserts and must fail loudly when the target was never a member.
///
/// # Errors
///
/// Returns `AuthzError::NotAMember` if no row exists.
pub async fn require_membership_exists(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<Role, AuthzError> {
    Membership::get_role(pool, user_id, organization_id)
        .await?
        .ok_or(AuthzError::NotAMember {
            user_id,
            organization_id,
        })
}

/// Resolves the caller's accessible-organization set
///
/// Lists explicit memberships; when the user has none at all, runs the
/// legacy backfill resolver with the supplied organization hint. This is
/// the only role-resolution path that may mutate state.
///
/// # Errors
///
/// Returns a database error if either lookup fails.
pub async fn accessible_organizations(
    pool: &PgPool,
    user_id: Uuid,
    current_org_hint: Option<Uuid>,
) -> Result<Vec<Uuid>, AuthzError> {
    let memberships = backfill::resolve_user_memberships(pool, user_id, current_org_hint).await?;

    Ok(memberships.into_iter().map(|m| m.organization_id).collect())
}

/// Checks that a task is reachable through the caller's organizations
///
/// # Errors
///
/// Returns `AuthzError::NoTaskAccess` if the task's organization is not
/// in the caller's accessible set.
pub async fn require_task_access(
    pool: &PgPool,
    user_id: Uuid,
    task: &Task,
    current_org_hint: Option<Uuid>,
) -> Result<(), AuthzError> {
    let organization_ids = accessible_organizations(pool, user_id, current_org_hint).await?;

    if !organization_ids.contains(&task.organization_id) {
        return Err(AuthzError::NoTaskAccess { task_id: task.id });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_task_mutation() {
        assert!(require_task_mutation(Role::Owner, TaskAction::Create).is_ok());
        assert!(require_task_mutation(Role::Admin, TaskAction::Delete).is_ok());

        let err = require_task_mutation(Role::Viewer, TaskAction::Update).unwrap_err();
        assert_eq!(err.to_string(), "viewers cannot update tasks");

        let err = require_task_mutation(Role::Viewer, TaskAction::Create).unwrap_err();
        assert_eq!(err.to_string(), "viewers cannot create tasks");
    }

    #[test]
    fn test_self_protection_guards() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(forbid_self_role_change(user, other).is_ok());
        assert!(forbid_self_removal(user, other).is_ok());

        let err = forbid_self_role_change(user, user).unwrap_err();
        assert_eq!(err.to_string(), "cannot change own role");

        let err = forbid_self_removal(user, user).unwrap_err();
        assert_eq!(err.to_string(), "cannot remove self");
    }

    #[test]
    fn test_error_reason_strings() {
        let err = AuthzError::NoOrgAccess {
            organization_id: Uuid::new_v4(),
        };
        assert_eq!(err.to_string(), "no organization access");

        let err = AuthzError::NoAccess {
            organization_id: Uuid::new_v4(),
        };
        assert_eq!(err.to_string(), "no access");

        let err = AuthzError::NoTaskAccess {
            task_id: Uuid::new_v4(),
        };
        assert_eq!(err.to_string(), "no task access");

        let err = AuthzError::InsufficientRole {
            required: Role::Admin,
            actual: Role::Viewer,
        };
        assert_eq!(err.to_string(), "requires ADMIN role or higher");
    }
}
