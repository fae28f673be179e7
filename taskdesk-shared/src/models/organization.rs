/// Organization model and database operations
///
/// Organizations are the tenant boundary in TaskDesk: every task belongs
/// to exactly one organization, and users get access through Membership
/// rows. The optional `parent_id` self-reference is preserved from the
/// legacy schema; nothing in the business logic walks the tree.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     parent_id UUID REFERENCES organizations(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::organization::Organization;
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let org = Organization::create(&pool, "Acme Corp", None).await?;
/// println!("Created organization: {}", org.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Organization model representing a tenant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Organization name
    pub name: String,

    /// Optional parent organization (legacy tree, unused by business logic)
    pub parent_id: Option<Uuid>,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization
    ///
    /// Always succeeds for a valid `parent_id`. Does NOT create a
    /// membership; callers that want the creator to own the organization
    /// add an Owner membership themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `parent_id` references a nonexistent organization
    /// - Database connection fails
    pub async fn create(
        pool: &PgPool,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, parent_id)
            VALUES ($1, $2)
            RETURNING id, name, parent_id, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(parent_id)
        .fetch_one(pool)
        .await?;

        Ok(organization)
    }

    /// Finds an organization by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, parent_id, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(organization)
    }

    /// Finds an organization by name (case-sensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, parent_id, created_at, updated_at
            FROM organizations
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(organization)
    }

    /// Finds or creates the shared "Default Organization"
    ///
    /// Legacy seeding path: pre-migration installs routed all tasks to a
    /// single default organization.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn find_or_create_default(pool: &PgPool) -> Result<Self, sqlx::Error> {
        if let Some(org) = Self::find_by_name(pool, "Default Organization").await? {
            return Ok(org);
        }

        Self::create(pool, "Default Organization", None).await
    }

    /// Renames an organization
    ///
    /// Returns None if the organization doesn't exist; callers surface
    /// that as a NotFound error.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, parent_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(organization)
    }

    /// Lists organizations by a set of ids
    ///
    /// Used to materialize the caller's accessible-organization set.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn list_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let organizations = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, parent_id, created_at, updated_at
            FROM organizations
            WHERE id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(organizations)
    }

    /// Counts total number of organizations
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM organizations")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_serializes_parent_id() {
        let org = Organization {
            id: Uuid::new_v4(),
            name: "Acme Corp".to_string(),
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&org).unwrap();
        assert_eq!(json["name"], "Acme Corp");
        assert!(json["parent_id"].is_null());
    }

    // Integration tests for database operations are in tests/rbac_tests.rs
}
