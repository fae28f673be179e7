/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token
///
/// Registration creates the user, an auto-created personal organization,
/// and an Owner membership in it. Login resolves the user's current
/// organization from their first membership, running the legacy backfill
/// for pre-migration accounts with no membership rows.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::{authorization, jwt, password},
    models::{
        membership::{Membership, Role},
        organization::Organization,
        user::{CreateUser, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Optional display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    /// Optional name for the auto-created personal organization
    #[validate(length(max = 100, message = "Organization name must be at most 100 characters"))]
    pub organization_name: Option<String>,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// User ID
    pub user_id: Uuid,

    /// Auto-created organization ID
    pub organization_id: Uuid,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: Uuid,

    /// Current organization ID (first membership; None for users with no
    /// organizations)
    pub organization_id: Option<Uuid>,

    /// Role in the current organization
    pub role: Role,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

fn validation_details(e: validator::ValidationErrors) -> ApiError {
    let errors: Vec<ValidationErrorDetail> = e
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    ApiError::ValidationError(errors)
}

/// Register a new user
///
/// Creates the user account, an auto-created personal organization, and
/// an Owner membership in it.
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    req.validate().map_err(validation_details)?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.clone(),
            password_hash,
            name: req.name.clone(),
        },
    )
    .await?;

    // Auto-create a personal organization with the registrant as Owner
    let organization_name = req
        .organization_name
        .unwrap_or_else(|| format!("{}'s Workspace", req.name.as_deref().unwrap_or("User")));

    let organization = Organization::create(&state.db, &organization_name, None).await?;

    Membership::set_role(&state.db, user.id, organization.id, Role::Owner).await?;

    let access_claims = jwt::Claims::new(
        user.id,
        Some(organization.id),
        Role::Owner,
        jwt::TokenType::Access,
    );
    let refresh_claims = jwt::Claims::new(
        user.id,
        Some(organization.id),
        Role::Owner,
        jwt::TokenType::Refresh,
    );

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(Json(RegisterResponse {
        user_id: user.id,
        organization_id: organization.id,
        access_token,
        refresh_token,
    }))
}

/// Login endpoint
///
/// Authenticates a user and returns JWT tokens. The current organization
/// is the user's first membership; legacy accounts with no membership
/// rows go through the backfill resolver here.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(validation_details)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    // First accessible organization becomes the token's org context;
    // the lookup backfills memberships for legacy accounts.
    let organization_ids =
        authorization::accessible_organizations(&state.db, user.id, None).await?;
    let organization_id = organization_ids.first().copied();

    let role = match organization_id {
        Some(org_id) => Membership::get_role(&state.db, user.id, org_id)
            .await?
            .unwrap_or(Role::Viewer),
        None => Role::Viewer,
    };

    let access_claims = jwt::Claims::new(user.id, organization_id, role, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, organization_id, role, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        organization_id,
        role,
        access_token,
        refresh_token,
    }))
}

/// Refresh endpoint
///
/// Exchanges a valid refresh token for a new access token. The role claim
/// is re-read from the membership store so the new token reflects the
/// current role, not the one at refresh-token issue time.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let role = match claims.org_id {
        Some(org_id) => Membership::get_role(&state.db, claims.sub, org_id)
            .await?
            .unwrap_or(Role::Viewer),
        None => Role::Viewer,
    };

    let access_claims = jwt::Claims::new(claims.sub, claims.org_id, role, jwt::TokenType::Access);
    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}
