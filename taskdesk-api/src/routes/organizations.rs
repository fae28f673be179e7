/// Organization and membership endpoints
///
/// # Endpoints
///
/// - `POST /v1/organizations` - Create organization (any authenticated user)
/// - `GET /v1/organizations` - List caller's organizations with roles
/// - `PATCH /v1/organizations/:id` - Rename (Admin+)
/// - `GET /v1/organizations/:id/members` - List members (any role)
/// - `POST /v1/organizations/:id/members` - Add member by email (Admin+)
/// - `PATCH /v1/organizations/:id/members/:user_id/role` - Change role (Admin+)
/// - `DELETE /v1/organizations/:id/members/:user_id` - Remove member (Admin+)
///
/// Creation is unrestricted and makes the creator Owner. Member
/// management is gated on Admin or higher, with the self-protection rules
/// applied before any write: callers can never change their own role or
/// remove themselves, whatever their role.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskdesk_shared::{
    auth::{authorization, middleware::Principal},
    models::{
        membership::{MemberWithEmail, Membership, Role},
        organization::Organization,
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create organization request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    /// Organization name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Optional parent organization (legacy tree)
    pub parent_id: Option<Uuid>,
}

/// Rename organization request
#[derive(Debug, Deserialize, Validate)]
pub struct RenameOrganizationRequest {
    /// New organization name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Add member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    /// Email of the user to add
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Role to assign
    pub role: Role,
}

/// Update member role request
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRoleRequest {
    /// New role
    pub role: Role,
}

/// Organization response including the member role map
#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    /// The organization record
    #[serde(flatten)]
    pub organization: Organization,

    /// Member roles keyed by user id
    pub roles: HashMap<Uuid, Role>,
}

/// Members list response
#[derive(Debug, Serialize)]
pub struct MembersResponse {
    /// Organization members with emails
    pub members: Vec<MemberWithEmail>,
}

async fn organization_with_roles(
    state: &AppState,
    organization: Organization,
) -> ApiResult<OrganizationResponse> {
    let memberships = Membership::list_by_organization(&state.db, organization.id).await?;

    let roles = memberships
        .into_iter()
        .map(|m| (m.user_id, m.role))
        .collect();

    Ok(OrganizationResponse {
        organization,
        roles,
    })
}

/// Create a new organization
///
/// Unrestricted: any authenticated user may create an organization and
/// becomes its Owner.
pub async fn create_organization(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateOrganizationRequest>,
) -> ApiResult<Json<OrganizationResponse>> {
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let organization = Organization::create(&state.db, &req.name, req.parent_id).await?;

    Membership::set_role(&state.db, principal.user_id, organization.id, Role::Owner).await?;

    tracing::info!(
        organization_id = %organization.id,
        user_id = %principal.user_id,
        "Organization created"
    );

    let response = organization_with_roles(&state, organization).await?;
    Ok(Json(response))
}

/// List the caller's organizations with their role maps
///
/// Runs the legacy backfill for accounts with no membership rows, using
/// the token's organization claim as the hint.
pub async fn get_user_organizations(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<Vec<OrganizationResponse>>> {
    let organization_ids = authorization::accessible_organizations(
        &state.db,
        principal.user_id,
        principal.organization_id,
    )
    .await?;

    let organizations = Organization::list_by_ids(&state.db, &organization_ids).await?;

    let mut responses = Vec::with_capacity(organizations.len());
    for organization in organizations {
        responses.push(organization_with_roles(&state, organization).await?);
    }

    Ok(Json(responses))
}

/// Rename an organization (Admin+)
pub async fn rename_organization(
    State(state): State<AppState>,
    principal: Principal,
    Path(organization_id): Path<Uuid>,
    Json(req): Json<RenameOrganizationRequest>,
) -> ApiResult<Json<OrganizationResponse>> {
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    authorization::require_member_management(&state.db, principal.user_id, organization_id).await?;

    let organization = Organization::rename(&state.db, organization_id, &req.name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let response = organization_with_roles(&state, organization).await?;
    Ok(Json(response))
}

/// List members of an organization
///
/// Requires any role in the organization; Viewers may list members.
pub async fn list_members(
    State(state): State<AppState>,
    principal: Principal,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<MembersResponse>> {
    authorization::require_any_role(&state.db, principal.user_id, organization_id).await?;

    let members = Membership::list_members_with_email(&state.db, organization_id).await?;

    Ok(Json(MembersResponse { members }))
}

/// Add a member by email (Admin+)
///
/// Upserts the membership: adding an existing member changes their role.
/// Targeting yourself is rejected by the self-protection rule, since the
/// upsert could change your own role.
pub async fn add_member(
    State(state): State<AppState>,
    principal: Principal,
    Path(organization_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<MembersResponse>> {
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    authorization::require_member_management(&state.db, principal.user_id, organization_id).await?;

    let target = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User with this email does not exist".to_string()))?;

    authorization::forbid_self_role_change(principal.user_id, target.id)?;

    Membership::set_role(&state.db, target.id, organization_id, req.role).await?;

    tracing::info!(
        organization_id = %organization_id,
        target_user_id = %target.id,
        role = %req.role,
        added_by = %principal.user_id,
        "Member added"
    );

    let members = Membership::list_members_with_email(&state.db, organization_id).await?;
    Ok(Json(MembersResponse { members }))
}

/// Change a member's role (Admin+)
///
/// Fails with 404 when the target has no membership row; role assignment
/// for new members goes through `add_member`.
pub async fn update_member_role(
    State(state): State<AppState>,
    principal: Principal,
    Path((organization_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMemberRoleRequest>,
) -> ApiResult<Json<MembersResponse>> {
    authorization::require_member_management(&state.db, principal.user_id, organization_id).await?;

    authorization::forbid_self_role_change(principal.user_id, user_id)?;

    authorization::require_membership_exists(&state.db, user_id, organization_id).await?;

    Membership::set_role(&state.db, user_id, organization_id, req.role).await?;

    tracing::info!(
        organization_id = %organization_id,
        target_user_id = %user_id,
        role = %req.role,
        changed_by = %principal.user_id,
        "Member role updated"
    );

    let members = Membership::list_members_with_email(&state.db, organization_id).await?;
    Ok(Json(MembersResponse { members }))
}

/// Remove a member (Admin+)
///
/// Fails with 404 when the target has no membership row.
pub async fn remove_member(
    State(state): State<AppState>,
    principal: Principal,
    Path((organization_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MembersResponse>> {
    authorization::require_member_management(&state.db, principal.user_id, organization_id).await?;

    authorization::forbid_self_removal(principal.user_id, user_id)?;

    authorization::require_membership_exists(&state.db, user_id, organization_id).await?;

    Membership::remove(&state.db, user_id, organization_id).await?;

    tracing::info!(
        organization_id = %organization_id,
        target_user_id = %user_id,
        removed_by = %principal.user_id,
        "Member removed"
    );

    let members = Membership::list_members_with_email(&state.db, organization_id).await?;
    Ok(Json(MembersResponse { members }))
}
