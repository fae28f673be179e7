/// Task endpoints
///
/// # Endpoints
///
/// - `POST /v1/tasks` - Create task
/// - `GET /v1/tasks` - List tasks across the caller's organizations
/// - `GET /v1/tasks/:id` - Get a task
/// - `PATCH /v1/tasks/:id` - Update a task
/// - `DELETE /v1/tasks/:id` - Delete a task
///
/// Every handler runs the same guard sequence: resolve the target
/// organization, look up the caller's membership role there (absence
/// means no access), reject Viewers on mutations, then perform the CRUD
/// operation. A task is only ever reachable through its organization.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use taskdesk_shared::{
    auth::{
        authorization::{self, TaskAction},
        middleware::Principal,
    },
    models::task::{CreateTask, Task, TaskStatus, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Longer description
    #[serde(default)]
    pub description: String,

    /// Initial status (defaults to OPEN)
    pub status: Option<TaskStatus>,

    /// Target organization; defaults to the caller's current organization
    pub organization_id: Option<Uuid>,

    /// Assigned user
    pub assignee_id: Option<Uuid>,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Update task request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
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

/// Create a new task
///
/// The target organization is taken from the request body, falling back
/// to the caller's current organization. The caller needs a membership
/// there, and Viewers cannot create tasks.
pub async fn create_task(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let organization_id = req
        .organization_id
        .or(principal.organization_id)
        .ok_or_else(|| ApiError::BadRequest("Organization ID is required".to_string()))?;

    let role =
        authorization::require_org_access(&state.db, principal.user_id, organization_id).await?;

    authorization::require_task_mutation(role, TaskAction::Create)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or(TaskStatus::Open),
            organization_id,
            assignee_id: req.assignee_id,
            tags: req.tags,
        },
    )
    .await?;

    tracing::info!(
        task_id = %task.id,
        organization_id = %organization_id,
        user_id = %principal.user_id,
        "Task created"
    );

    Ok(Json(task))
}

/// List tasks across all organizations the caller can access
///
/// Legacy accounts with no membership rows go through the backfill
/// resolver here; isolation falls out of the organization filter.
pub async fn list_tasks(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<Vec<Task>>> {
    let organization_ids = authorization::accessible_organizations(
        &state.db,
        principal.user_id,
        principal.organization_id,
    )
    .await?;

    if organization_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let tasks = Task::list_by_organizations(&state.db, &organization_ids).await?;

    Ok(Json(tasks))
}

/// Loads a task and checks the caller can reach it through one of their
/// organizations
async fn find_accessible_task(
    state: &AppState,
    principal: &Principal,
    task_id: Uuid,
) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {} not found", task_id)))?;

    authorization::require_task_access(
        &state.db,
        principal.user_id,
        &task,
        principal.organization_id,
    )
    .await?;

    Ok(task)
}

/// Get a single task
pub async fn get_task(
    State(state): State<AppState>,
    principal: Principal,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = find_accessible_task(&state, &principal, task_id).await?;

    Ok(Json(task))
}

/// Update a task
///
/// Role is resolved in the task's organization, not the caller's current
/// one; Viewers cannot update.
pub async fn update_task(
    State(state): State<AppState>,
    principal: Principal,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let task = find_accessible_task(&state, &principal, task_id).await?;

    let role =
        authorization::require_org_access(&state.db, principal.user_id, task.organization_id)
            .await?;

    authorization::require_task_mutation(role, TaskAction::Update)?;

    let updated = Task::update(
        &state.db,
        task.id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            assignee_id: req.assignee_id,
            tags: req.tags,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Task {} not found", task_id)))?;

    tracing::info!(
        task_id = %task_id,
        user_id = %principal.user_id,
        role = %role,
        "Task updated"
    );

    Ok(Json(updated))
}

/// Delete a task
///
/// Same guard as update; Viewers cannot delete.
pub async fn delete_task(
    State(state): State<AppState>,
    principal: Principal,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let task = find_accessible_task(&state, &principal, task_id).await?;

    let role =
        authorization::require_org_access(&state.db, principal.user_id, task.organization_id)
            .await?;

    authorization::require_task_mutation(role, TaskAction::Delete)?;

    Task::delete(&state.db, task.id).await?;

    tracing::info!(
        task_id = %task_id,
        user_id = %principal.user_id,
        role = %role,
        "Task deleted"
    );

    Ok(Json(serde_json::json!({ "deleted": true })))
}
