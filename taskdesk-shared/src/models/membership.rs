/// Membership model and database operations
///
/// This module provides the Membership model for user-organization
/// relationships with RBAC, and the `Role` enum that drives every access
/// decision in TaskDesk.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_role AS ENUM ('owner', 'admin', 'viewer');
///
/// CREATE TABLE memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     role membership_role NOT NULL DEFAULT 'viewer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT memberships_user_org_key UNIQUE (user_id, organization_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: Full control over the organization and its tasks
/// - **admin**: Manage members and tasks
/// - **viewer**: Read-only access
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::membership::{Membership, Role};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let organization_id = Uuid::new_v4();
/// let user_id = Uuid::new_v4();
///
/// // Add a user to an organization as an admin (upsert)
/// let membership = Membership::set_role(&pool, user_id, organization_id, Role::Admin).await?;
///
/// // Look up their role later
/// let role = Membership::get_role(&pool, user_id, organization_id).await?;
/// assert_eq!(role, Some(Role::Admin));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// RBAC role within an organization
///
/// A closed three-value set with a total order: Owner > Admin > Viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full control over the organization
    Owner,

    /// Can manage members and tasks
    Admin,

    /// Read-only access to tasks and members
    Viewer,
}

impl Role {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Admin => "ADMIN",
            Role::Viewer => "VIEWER",
        }
    }

    /// Checks whether this role meets a required threshold
    ///
    /// Hierarchy: Owner > Admin > Viewer. Returns true iff this role's
    /// rank is greater than or equal to the threshold's rank.
    pub fn is_at_least(&self, threshold: Role) -> bool {
        self.rank() >= threshold.rank()
    }

    /// Checks whether this role may mutate tasks and membership
    ///
    /// Viewer is strictly read-only; Owner and Admin may mutate.
    pub fn can_mutate(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    fn rank(&self) -> u8 {
        match self {
            Role::Owner => 3,
            Role::Admin => 2,
            Role::Viewer => 1,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership model representing a user-organization relationship
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Unique membership ID
    pub id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Organization ID
    pub organization_id: Uuid,

    /// Role within the organization
    pub role: Role,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// A member row joined with the user's email, for member listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberWithEmail {
    /// User ID
    pub user_id: Uuid,

    /// Role within the organization
    pub role: Role,

    /// User's email (None if the user row was deleted)
    pub email: Option<String>,
}

impl Membership {
    /// Assigns a role, creating the membership if absent (upsert)
    ///
    /// This is the single write path for both "add member" and "change
    /// role". The upsert is atomic: concurrent calls for the same
    /// `(user_id, organization_id)` pair resolve through the unique
    /// constraint and never produce duplicate rows.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - User or organization doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn set_role(
        pool: &PgPool,
        user_id: Uuid,
        organization_id: Uuid,
        role: Role,
    ) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (user_id, organization_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, organization_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING id, user_id, organization_id, role, created_at
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Creates the membership only if no row exists, preserving any
    /// existing role
    ///
    /// Used by the legacy backfill resolver: running it twice must not
    /// change previously-assigned roles. Returns the row as it exists
    /// after the call, whoever wrote it.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn create_if_absent(
        pool: &PgPool,
        user_id: Uuid,
        organization_id: Uuid,
        role: Role,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO memberships (user_id, organization_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, organization_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(role)
        .execute(pool)
        .await?;

        // Re-read: either our insert or a concurrent writer's row.
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, organization_id, role, created_at
            FROM memberships
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Gets a user's role in an organization
    ///
    /// None means "no access". Triggers no mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn get_role(
        pool: &PgPool,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Role>, sqlx::Error> {
        let role: Option<Role> = sqlx::query_scalar(
            r#"
            SELECT role FROM memberships
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Deletes a membership (removes user from organization)
    ///
    /// Returns false if no membership row existed; callers surface that
    /// as a NotAMember error.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn remove(
        pool: &PgPool,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM memberships WHERE user_id = $1 AND organization_id = $2")
                .bind(user_id)
                .bind(organization_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all members of an organization
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, organization_id, role, created_at
            FROM memberships
            WHERE organization_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Lists an organization's members with their emails
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn list_members_with_email(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<MemberWithEmail>, sqlx::Error> {
        let members = sqlx::query_as::<_, MemberWithEmail>(
            r#"
            SELECT m.user_id, m.role, u.email
            FROM memberships m
            LEFT JOIN users u ON u.id = m.user_id
            WHERE m.organization_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Lists all organizations a user belongs to
    ///
    /// An empty result means the user has no explicit memberships; the
    /// legacy backfill resolver keys off this.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, organization_id, role, created_at
            FROM memberships
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Counts members in an organization
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn count_by_organization(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE organization_id = $1")
                .bind(organization_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Owner.as_str(), "OWNER");
        assert_eq!(Role::Admin.as_str(), "ADMIN");
        assert_eq!(Role::Viewer.as_str(), "VIEWER");
    }

    #[test]
    fn test_role_hierarchy() {
        // Owner meets every threshold
        assert!(Role::Owner.is_at_least(Role::Owner));
        assert!(Role::Owner.is_at_least(Role::Admin));
        assert!(Role::Owner.is_at_least(Role::Viewer));

        // Admin meets admin and viewer, not owner
        assert!(!Role::Admin.is_at_least(Role::Owner));
        assert!(Role::Admin.is_at_least(Role::Admin));
        assert!(Role::Admin.is_at_least(Role::Viewer));

        // Viewer only meets viewer
        assert!(!Role::Viewer.is_at_least(Role::Owner));
        assert!(!Role::Viewer.is_at_least(Role::Admin));
        assert!(Role::Viewer.is_at_least(Role::Viewer));
    }

    #[test]
    fn test_role_can_mutate() {
        assert!(Role::Owner.can_mutate());
        assert!(Role::Admin.can_mutate());
        assert!(!Role::Viewer.can_mutate());
    }

    #[test]
    fn test_role_serde_uppercase() {
        // Wire format uses the legacy uppercase names
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"OWNER\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"VIEWER\"").unwrap(),
            Role::Viewer
        );
        assert!(serde_json::from_str::<Role>("\"MEMBER\"").is_err());
    }

    // Integration tests for database operations are in tests/rbac_tests.rs
}
