/// Database models for TaskDesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and authentication
/// - `organization`: Tenant boundary owning tasks and members
/// - `membership`: User-organization relationships with roles
/// - `task`: Tracked work items, owned by exactly one organization
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::organization::Organization;
/// use taskdesk_shared::models::membership::{Membership, Role};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let org = Organization::create(&pool, "Acme Corp", None).await?;
/// let creator = Uuid::new_v4();
/// Membership::set_role(&pool, creator, org.id, Role::Owner).await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod organization;
pub mod task;
pub mod user;
