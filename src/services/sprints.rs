/// Sprint operations and lifecycle workflows
///
/// Two paths can make a sprint active and they resolve conflicts
/// differently on purpose:
///
/// - [`update_sprint`] treats status as a plain field. Setting `active`
///   while a sibling is active is rejected.
/// - [`activate_sprint`] is the workflow: it demotes the active sibling
///   to planning and promotes the target, atomically. It is the only
///   path allowed to demote.
///
/// Completion is terminal and detaches every task that has not reached
/// deployed status, in the same transaction as the status flip.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization::{authorize, require_member, Action, Target};
use crate::error::{Error, Result, ValidationError};
use crate::models::sprint::{CreateSprint, Sprint, SprintStatus, UpdateSprint};
use crate::models::task::Task;

/// A sprint with its tasks and progress
#[derive(Debug, Clone, serde::Serialize)]
pub struct SprintDetail {
    /// The sprint itself
    pub sprint: Sprint,

    /// Tasks scheduled in the sprint, in board order
    pub tasks: Vec<Task>,

    /// Percentage of tasks that reached deployed status
    pub completion: i64,
}

/// Creates a sprint in planning status
///
/// Any member of the project may create sprints. Dates are validated
/// before anything is written.
pub async fn create_sprint(pool: &PgPool, principal: Uuid, data: CreateSprint) -> Result<Sprint> {
    data.validate()?;
    require_member(pool, data.project_id, principal).await?;
    Sprint::validate_dates(data.start_date, data.end_date)?;

    let sprint = Sprint::create(pool, data).await?;
    info!(sprint_id = %sprint.id, project_id = %sprint.project_id, "created sprint");

    Ok(sprint)
}

/// Fetches a sprint the principal can read
pub async fn get_sprint(pool: &PgPool, principal: Uuid, sprint_id: Uuid) -> Result<Sprint> {
    authorize(pool, principal, Action::Read, Target::Sprint(sprint_id)).await?;

    Sprint::find_by_id(pool, sprint_id)
        .await?
        .ok_or(Error::NotFound("sprint"))
}

/// Fetches a sprint with its tasks and completion figure
pub async fn sprint_detail(pool: &PgPool, principal: Uuid, sprint_id: Uuid) -> Result<SprintDetail> {
    let sprint = get_sprint(pool, principal, sprint_id).await?;
    let tasks = Task::list_by_sprint(pool, sprint_id).await?;
    let completion = Sprint::completion_percentage(pool, sprint_id).await?;

    Ok(SprintDetail {
        sprint,
        tasks,
        completion,
    })
}

/// Applies a partial update to a sprint
///
/// The patched dates must still be ordered. A direct status change obeys
/// the lifecycle: nothing leaves `completed`, and `active` is refused
/// while a sibling holds it.
pub async fn update_sprint(
    pool: &PgPool,
    principal: Uuid,
    sprint_id: Uuid,
    data: UpdateSprint,
) -> Result<Sprint> {
    data.validate()?;
    authorize(pool, principal, Action::Write, Target::Sprint(sprint_id)).await?;

    let sprint = Sprint::find_by_id(pool, sprint_id)
        .await?
        .ok_or(Error::NotFound("sprint"))?;

    let start = data.start_date.unwrap_or(sprint.start_date);
    let end = data.end_date.unwrap_or(sprint.end_date);
    Sprint::validate_dates(start, end)?;

    if let Some(new_status) = data.status {
        if new_status != sprint.status {
            if sprint.status.is_terminal() {
                return Err(ValidationError::InvalidTransition {
                    from: sprint.status.as_str(),
                    to: new_status.as_str(),
                }
                .into());
            }

            // a second active sprint is rejected here, never demoted
            if new_status == SprintStatus::Active {
                let sibling =
                    Sprint::find_active_sibling(pool, sprint.project_id, sprint_id).await?;
                if sibling.is_some() {
                    return Err(ValidationError::DuplicateActiveSprint.into());
                }
            }
        }
    }

    Sprint::update(pool, sprint_id, data)
        .await?
        .ok_or(Error::NotFound("sprint"))
}

/// Makes a sprint the project's active one
///
/// Demotes whatever sibling is currently active back to planning and
/// promotes the target, in one transaction. Activating the already
/// active sprint is a quiet success; a completed sprint cannot come
/// back.
///
/// Two racing activations serialize on the partial unique index; the
/// loser gets `Error::Conflict`.
pub async fn activate_sprint(pool: &PgPool, principal: Uuid, sprint_id: Uuid) -> Result<Sprint> {
    authorize(pool, principal, Action::Write, Target::Sprint(sprint_id)).await?;

    let sprint = Sprint::find_by_id(pool, sprint_id)
        .await?
        .ok_or(Error::NotFound("sprint"))?;

    if sprint.status == SprintStatus::Active {
        return Ok(sprint);
    }
    if !sprint.status.can_transition_to(SprintStatus::Active) {
        return Err(ValidationError::InvalidTransition {
            from: sprint.status.as_str(),
            to: SprintStatus::Active.as_str(),
        }
        .into());
    }

    let mut tx = pool.begin().await?;

    let demoted = Sprint::demote_active_siblings(&mut tx, sprint.project_id, sprint_id).await?;
    let activated = Sprint::set_status(&mut tx, sprint_id, SprintStatus::Active)
        .await?
        .ok_or(Error::NotFound("sprint"))?;

    tx.commit().await?;

    info!(%sprint_id, demoted, "activated sprint");
    Ok(activated)
}

/// Completes a sprint
///
/// Flips the status and detaches every task that has not reached
/// deployed status, leaving each task's own status untouched. Deployed
/// tasks keep their sprint link as the historical record. One
/// transaction covers both steps.
pub async fn complete_sprint(pool: &PgPool, principal: Uuid, sprint_id: Uuid) -> Result<Sprint> {
    authorize(pool, principal, Action::Write, Target::Sprint(sprint_id)).await?;

    let sprint = Sprint::find_by_id(pool, sprint_id)
        .await?
        .ok_or(Error::NotFound("sprint"))?;

    if !sprint.status.can_transition_to(SprintStatus::Completed) {
        return Err(ValidationError::InvalidTransition {
            from: sprint.status.as_str(),
            to: SprintStatus::Completed.as_str(),
        }
        .into());
    }

    let mut tx = pool.begin().await?;

    let completed = Sprint::set_status(&mut tx, sprint_id, SprintStatus::Completed)
        .await?
        .ok_or(Error::NotFound("sprint"))?;
    let detached = Task::detach_unfinished(&mut tx, sprint_id).await?;

    tx.commit().await?;

    info!(%sprint_id, detached, "completed sprint");
    Ok(completed)
}

/// Deletes a sprint; its tasks return to the backlog
pub async fn delete_sprint(pool: &PgPool, principal: Uuid, sprint_id: Uuid) -> Result<()> {
    authorize(pool, principal, Action::Delete, Target::Sprint(sprint_id)).await?;

    Sprint::delete(pool, sprint_id).await?;
    info!(%sprint_id, "deleted sprint");

    Ok(())
}
