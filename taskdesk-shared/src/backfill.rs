/// Legacy membership backfill resolver
///
/// Pre-migration installs had no membership rows: access was implied by
/// task assignment and by the organization id baked into old tokens. This
/// module reconciles such users on first contact by materializing
/// explicit membership rows.
///
/// The resolver runs only for users with zero membership rows, and every
/// row it creates uses `ON CONFLICT DO NOTHING`, so it is idempotent:
/// running it twice creates no duplicates and never changes a
/// previously-assigned role. It is also the only place in the system that
/// grants Owner implicitly.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::backfill::resolve_user_memberships;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, org_hint: Option<Uuid>) -> Result<(), sqlx::Error> {
/// let memberships = resolve_user_memberships(&pool, user_id, org_hint).await?;
/// println!("User belongs to {} organizations", memberships.len());
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::membership::{Membership, Role};
use crate::models::task::Task;

/// Returns the user's memberships, materializing them from legacy data
/// when none exist
///
/// Resolution order for a user with zero membership rows:
/// 1. Distinct organizations of tasks assigned to the user.
/// 2. The `current_org_hint` (organization id from a legacy token), if
///    not already in the set.
/// 3. If the set is still empty, every organization referenced by any
///    task (migration-window fallback).
///
/// Each resolved organization gets a membership row with role Owner
/// unless a row already exists. Partial completion is safe: every insert
/// is independent, and a later call resumes where this one stopped.
///
/// # Errors
///
/// Returns an error if database connection fails.
pub async fn resolve_user_memberships(
    pool: &PgPool,
    user_id: Uuid,
    current_org_hint: Option<Uuid>,
) -> Result<Vec<Membership>, sqlx::Error> {
    let memberships = Membership::list_by_user(pool, user_id).await?;
    if !memberships.is_empty() {
        return Ok(memberships);
    }

    let mut organization_ids = Task::organizations_for_assignee(pool, user_id).await?;

    if let Some(hint) = current_org_hint {
        if !organization_ids.contains(&hint) {
            organization_ids.push(hint);
        }
    }

    if organization_ids.is_empty() {
        // Migration-window fallback: grants Owner on every organization
        // any task references. Kept for legacy-data compatibility.
        organization_ids = Task::all_referenced_organizations(pool).await?;

        if !organization_ids.is_empty() {
            warn!(
                %user_id,
                organizations = organization_ids.len(),
                "Backfill fallback granting access to all task-referenced organizations"
            );
        }
    }

    if organization_ids.is_empty() {
        debug!(%user_id, "No legacy data to backfill memberships from");
        return Ok(Vec::new());
    }

    info!(
        %user_id,
        organizations = organization_ids.len(),
        "Backfilling memberships from legacy task data"
    );

    for organization_id in &organization_ids {
        Membership::create_if_absent(pool, user_id, *organization_id, Role::Owner).await?;
    }

    Membership::list_by_user(pool, user_id).await
}

// Idempotence and fallback behavior are covered by database-backed tests
// in tests/rbac_tests.rs.
