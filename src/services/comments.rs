/// Comment operations
///
/// Members of a task's project may read and add comments; editing and
/// deleting belong to the author alone.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization::{authorize, require_member, Action, Target};
use crate::error::{Error, Result};
use crate::models::comment::{Comment, CreateComment};
use crate::models::task::Task;

/// Creates a comment on a task, authored by the principal
pub async fn create_comment(
    pool: &PgPool,
    principal: Uuid,
    data: CreateComment,
) -> Result<Comment> {
    data.validate()?;

    let task = Task::find_by_id(pool, data.task_id)
        .await?
        .ok_or(Error::NotFound("task"))?;
    require_member(pool, task.project_id, principal).await?;

    Ok(Comment::create(pool, principal, data).await?)
}

/// Replaces a comment's text; author only
pub async fn update_comment(
    pool: &PgPool,
    principal: Uuid,
    comment_id: Uuid,
    body: String,
) -> Result<Comment> {
    authorize(pool, principal, Action::Write, Target::Comment(comment_id)).await?;

    Comment::update_body(pool, comment_id, body)
        .await?
        .ok_or(Error::NotFound("comment"))
}

/// Deletes a comment; author only
pub async fn delete_comment(pool: &PgPool, principal: Uuid, comment_id: Uuid) -> Result<()> {
    authorize(pool, principal, Action::Delete, Target::Comment(comment_id)).await?;

    Comment::delete(pool, comment_id).await?;
    Ok(())
}

/// Lists a task's comments for a member
pub async fn list_comments(pool: &PgPool, principal: Uuid, task_id: Uuid) -> Result<Vec<Comment>> {
    let task = Task::find_by_id(pool, task_id)
        .await?
        .ok_or(Error::NotFound("task"))?;
    require_member(pool, task.project_id, principal).await?;

    Ok(Comment::list_by_task(pool, task_id).await?)
}
