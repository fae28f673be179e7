/// Authentication middleware types for Axum
///
/// After JWT validation the HTTP layer inserts a [`Principal`] into the
/// request extensions; handlers take it as an extractor argument.
///
/// The principal is deliberately a plain typed struct. The role and
/// organization context it carries come from the token and are treated as
/// legacy hints: authorization helpers re-read the membership store on
/// every decision, so a stale token cannot outrank the current membership
/// row.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::middleware::Principal;
///
/// async fn handler(principal: Principal) -> String {
///     format!("User: {}", principal.user_id)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::membership::Role;

/// Authenticated request principal
///
/// Built from validated JWT claims, one per request. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role claimed at token issue time (informational; decisions use the
    /// membership store)
    pub role: Role,

    /// Organization context claimed at token issue time; used as the
    /// default target organization and as the legacy backfill hint. Absent
    /// for tokens issued to users with no memberships.
    pub organization_id: Option<Uuid>,
}

impl Principal {
    /// Creates a principal from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            organization_id: claims.org_id,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header or unauthenticated route
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;

    #[test]
    fn test_principal_from_claims() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Some(org_id), Role::Admin, TokenType::Access);

        let principal = Principal::from_claims(&claims);
        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.organization_id, Some(org_id));
        assert_eq!(principal.role, Role::Admin);
    }
}
