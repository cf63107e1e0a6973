/// Task operations
///
/// Any member may read a project's tasks; writing is reserved for the
/// task's creator, its assignee, and the project owner. The move
/// operation is the board's drag-and-drop: a partial patch over status,
/// sort key, and sprint.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization::{authorize, require_member, Action, Target};
use crate::error::{Error, Result, ValidationError};
use crate::models::comment::Comment;
use crate::models::sprint::Sprint;
use crate::models::task::{CreateTask, MoveTask, Task, UpdateTask};

/// A task with its discussion thread
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskDetail {
    /// The task itself
    pub task: Task,

    /// Comments, oldest first
    pub comments: Vec<Comment>,
}

/// Creates a task; the principal becomes its immutable creator
///
/// A sprint given at creation must belong to the task's project.
pub async fn create_task(pool: &PgPool, principal: Uuid, data: CreateTask) -> Result<Task> {
    data.validate()?;
    require_member(pool, data.project_id, principal).await?;

    if let Some(sprint_id) = data.sprint_id {
        check_sprint_project(pool, sprint_id, data.project_id).await?;
    }

    let task = Task::create(pool, principal, data).await?;
    info!(task_id = %task.id, project_id = %task.project_id, "created task");

    Ok(task)
}

/// Fetches a task the principal can read
pub async fn get_task(pool: &PgPool, principal: Uuid, task_id: Uuid) -> Result<Task> {
    authorize(pool, principal, Action::Read, Target::Task(task_id)).await?;

    Task::find_by_id(pool, task_id)
        .await?
        .ok_or(Error::NotFound("task"))
}

/// Fetches a task with its comments
pub async fn task_detail(pool: &PgPool, principal: Uuid, task_id: Uuid) -> Result<TaskDetail> {
    let task = get_task(pool, principal, task_id).await?;
    let comments = Comment::list_by_task(pool, task_id).await?;

    Ok(TaskDetail { task, comments })
}

/// Applies a partial field update
pub async fn update_task(
    pool: &PgPool,
    principal: Uuid,
    task_id: Uuid,
    data: UpdateTask,
) -> Result<Task> {
    data.validate()?;
    authorize(pool, principal, Action::Write, Target::Task(task_id)).await?;

    Task::update(pool, task_id, data)
        .await?
        .ok_or(Error::NotFound("task"))
}

/// Moves a task on the board
///
/// Any subset of status, sort key, and sprint may be supplied; absent
/// fields keep their value and an explicit null sprint detaches the task
/// to the backlog. A target sprint must belong to the task's project.
pub async fn move_task(
    pool: &PgPool,
    principal: Uuid,
    task_id: Uuid,
    data: MoveTask,
) -> Result<Task> {
    authorize(pool, principal, Action::Write, Target::Task(task_id)).await?;

    let task = Task::find_by_id(pool, task_id)
        .await?
        .ok_or(Error::NotFound("task"))?;

    if data.is_empty() {
        return Ok(task);
    }

    if let Some(Some(sprint_id)) = data.sprint {
        check_sprint_project(pool, sprint_id, task.project_id).await?;
    }

    let mut tx = pool.begin().await?;
    let moved = Task::apply_move(&mut tx, task_id, &data)
        .await?
        .ok_or(Error::NotFound("task"))?;
    tx.commit().await?;

    info!(%task_id, "moved task");
    Ok(moved)
}

/// Deletes a task and its comments
pub async fn delete_task(pool: &PgPool, principal: Uuid, task_id: Uuid) -> Result<()> {
    authorize(pool, principal, Action::Delete, Target::Task(task_id)).await?;

    Task::delete(pool, task_id).await?;
    info!(%task_id, "deleted task");

    Ok(())
}

/// Lists a project's tasks for a member
pub async fn list_project_tasks(
    pool: &PgPool,
    principal: Uuid,
    project_id: Uuid,
) -> Result<Vec<Task>> {
    require_member(pool, project_id, principal).await?;
    Ok(Task::list_by_project(pool, project_id).await?)
}

/// Lists a project's backlog for a member
pub async fn list_backlog(pool: &PgPool, principal: Uuid, project_id: Uuid) -> Result<Vec<Task>> {
    require_member(pool, project_id, principal).await?;
    Ok(Task::list_backlog(pool, project_id).await?)
}

/// Rejects a sprint that belongs to a different project
async fn check_sprint_project(pool: &PgPool, sprint_id: Uuid, project_id: Uuid) -> Result<()> {
    let sprint = Sprint::find_by_id(pool, sprint_id)
        .await?
        .ok_or(Error::NotFound("sprint"))?;

    if sprint.project_id != project_id {
        return Err(ValidationError::SprintProjectMismatch { sprint_id }.into());
    }

    Ok(())
}
