/// Task model and database operations
///
/// Tasks are the tracked work items of TaskDesk. Every task is owned by
/// exactly one organization; access always flows through the caller's
/// Membership role in that organization, never through the task itself.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('open', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'open',
///     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::task::{CreateTask, Task, TaskStatus};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Ship the release".to_string(),
///     description: "Cut and tag v1.2".to_string(),
///     status: TaskStatus::Open,
///     organization_id: Uuid::new_v4(),
///     assignee_id: None,
///     tags: vec!["release".to_string()],
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started
    Open,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "OPEN",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

/// Task model representing a tracked work item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Longer description
    pub description: String,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Organization this task belongs to
    pub organization_id: Uuid,

    /// Assigned user (nullable)
    pub assignee_id: Option<Uuid>,

    /// Free-form tags
    pub tags: Vec<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task title
    pub title: String,

    /// Longer description
    #[serde(default)]
    pub description: String,

    /// Initial status (defaults to Open)
    #[serde(default = "default_status")]
    pub status: TaskStatus,

    /// Owning organization
    pub organization_id: Uuid,

    /// Assigned user
    pub assignee_id: Option<Uuid>,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Open
}

/// Input for updating a task
///
/// Only non-None fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New assignee
    pub assignee_id: Option<Uuid>,

    /// Replacement tag list
    pub tags: Option<Vec<String>>,
}

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `organization_id` references a nonexistent organization
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, organization_id, assignee_id, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, status, organization_id, assignee_id, tags,
                      created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.organization_id)
        .bind(data.assignee_id)
        .bind(data.tags)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, organization_id, assignee_id, tags,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks across a set of organizations
    ///
    /// Callers pass their accessible-organization set; cross-tenant
    /// isolation falls out of the WHERE clause.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn list_by_organizations(
        pool: &PgPool,
        organization_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, organization_id, assignee_id, tags,
                   created_at, updated_at
            FROM tasks
            WHERE organization_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_ids)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task
    ///
    /// Only non-None fields in `data` are written; `updated_at` is always
    /// refreshed. Returns None if the task doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }
        if data.tags.is_some() {
            bind_count += 1;
            query.push_str(&format!(", tags = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, organization_id, \
             assignee_id, tags, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task by ID
    ///
    /// Returns true if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Distinct organization ids from tasks assigned to a user
    ///
    /// Legacy backfill input: pre-migration data carried access implicitly
    /// through task assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn organizations_for_assignee(
        pool: &PgPool,
        assignee_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT organization_id
            FROM tasks
            WHERE assignee_id = $1
            "#,
        )
        .bind(assignee_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// Distinct organization ids referenced by any task
    ///
    /// The legacy backfill's last-resort fallback; intentionally broad.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails.
    pub async fn all_referenced_organizations(pool: &PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT DISTINCT organization_id FROM tasks")
            .fetch_all(pool)
            .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Open.as_str(), "OPEN");
        assert_eq!(TaskStatus::InProgress.as_str(), "IN_PROGRESS");
        assert_eq!(TaskStatus::Done.as_str(), "DONE");
    }

    #[test]
    fn test_task_status_serde() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"DONE\"").unwrap(),
            TaskStatus::Done
        );
    }

    #[test]
    fn test_create_task_defaults() {
        let json = r#"{"title": "t", "organization_id": "7f0e8b1c-9f6e-4a9f-8a3a-0e4bfe1f0a11"}"#;
        let create: CreateTask = serde_json::from_str(json).unwrap();
        assert_eq!(create.status, TaskStatus::Open);
        assert!(create.description.is_empty());
        assert!(create.tags.is_empty());
    }

    #[test]
    fn test_update_task_default() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.status.is_none());
        assert!(update.tags.is_none());
    }
}
