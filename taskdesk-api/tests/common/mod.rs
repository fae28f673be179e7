/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup
/// - Test user/organization creation
/// - JWT token generation
/// - API client helpers

use sqlx::PgPool;
use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::Config;
use taskdesk_shared::auth::jwt::{create_token, Claims, TokenType};
use taskdesk_shared::models::membership::{Membership, Role};
use taskdesk_shared::models::organization::Organization;
use taskdesk_shared::models::task::{CreateTask, Task, TaskStatus};
use taskdesk_shared::models::user::{CreateUser, User};
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub organization: Organization,
    pub owner: User,
    pub owner_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh organization and owner
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../taskdesk-shared/migrations").run(&db).await?;

        let organization = Organization::create(
            &db,
            &format!("Test Organization {}", Uuid::new_v4()),
            None,
        )
        .await?;

        let owner = create_user(&db).await?;
        Membership::set_role(&db, owner.id, organization.id, Role::Owner).await?;

        let owner_token = token_for(&config, owner.id, Some(organization.id), Role::Owner)?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            organization,
            owner,
            owner_token,
        })
    }

    /// Creates another user with the given role in the test organization,
    /// returning the user and a bearer token
    pub async fn add_member(&self, role: Role) -> anyhow::Result<(User, String)> {
        let user = create_user(&self.db).await?;
        Membership::set_role(&self.db, user.id, self.organization.id, role).await?;

        let token = token_for(&self.config, user.id, Some(self.organization.id), role)?;

        Ok((user, token))
    }

    /// Creates a user with no memberships at all
    pub async fn add_outsider(&self) -> anyhow::Result<(User, String)> {
        let user = create_user(&self.db).await?;
        let token = token_for(&self.config, user.id, None, Role::Viewer)?;

        Ok((user, token))
    }

    /// Creates a task in the test organization
    pub async fn create_task(&self, title: &str) -> anyhow::Result<Task> {
        let task = Task::create(
            &self.db,
            CreateTask {
                title: title.to_string(),
                description: String::new(),
                status: TaskStatus::Open,
                organization_id: self.organization.id,
                assignee_id: None,
                tags: vec![],
            },
        )
        .await?;

        Ok(task)
    }
}

/// Creates a user with a unique email
pub async fn create_user(db: &PgPool) -> anyhow::Result<User> {
    let user = User::create(
        db,
        CreateUser {
            email: format!("test-{}@example.com", Uuid::new_v4()),
            password_hash: "test_hash".to_string(), // Not used in tests
            name: Some("Test User".to_string()),
        },
    )
    .await?;

    Ok(user)
}

/// Generates an access token for a user
pub fn token_for(
    config: &Config,
    user_id: Uuid,
    org_id: Option<Uuid>,
    role: Role,
) -> anyhow::Result<String> {
    let claims = Claims::new(user_id, org_id, role, TokenType::Access);
    Ok(create_token(&claims, &config.jwt.secret)?)
}

/// Reads a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
