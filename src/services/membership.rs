/// Membership administration
///
/// Only the project owner manages the member set. Both operations are
/// idempotent from the caller's view: adding an existing member and
/// removing a non-member are quiet successes. The one hard rule is that
/// the owner can never be removed, no matter who asks.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::authorization::{authorize, Action, Target};
use crate::error::{Error, Result, ValidationError};
use crate::models::project::Project;
use crate::models::user::User;

/// Adds a user to the project's member set
///
/// Adding the owner is a no-op: the owner is already an implicit member
/// and must stay irremovable, so no row is written.
pub async fn add_member(
    pool: &PgPool,
    principal: Uuid,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<()> {
    authorize(
        pool,
        principal,
        Action::ManageMembers,
        Target::Project(project_id),
    )
    .await?;

    User::find_by_id(pool, user_id)
        .await?
        .ok_or(Error::NotFound("user"))?;

    let project = Project::find_by_id(pool, project_id)
        .await?
        .ok_or(Error::NotFound("project"))?;

    if project.owner_id == user_id {
        return Ok(());
    }

    if Project::add_member(pool, project_id, user_id).await?.is_some() {
        info!(%project_id, %user_id, "added project member");
    }

    Ok(())
}

/// Removes a user from the project's member set
///
/// # Errors
///
/// Returns `ValidationError::OwnerRemoval` when the target is the owner.
pub async fn remove_member(
    pool: &PgPool,
    principal: Uuid,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<()> {
    authorize(
        pool,
        principal,
        Action::ManageMembers,
        Target::Project(project_id),
    )
    .await?;

    User::find_by_id(pool, user_id)
        .await?
        .ok_or(Error::NotFound("user"))?;

    let project = Project::find_by_id(pool, project_id)
        .await?
        .ok_or(Error::NotFound("project"))?;

    if project.owner_id == user_id {
        return Err(ValidationError::OwnerRemoval.into());
    }

    let removed = Project::remove_member(pool, project_id, user_id).await?;
    if removed {
        info!(%project_id, %user_id, "removed project member");
    }

    Ok(())
}
