/// Comment model and database operations
///
/// Comments hang off tasks. The author is fixed at creation; only the
/// author may edit or delete, which the authorization layer enforces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Comment record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Author; immutable after creation
    pub user_id: Uuid,

    /// Comment text
    pub body: String,

    /// When the comment was created
    pub created_at: DateTime<Utc>,

    /// When the comment was last edited
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateComment {
    /// Task to comment on
    pub task_id: Uuid,

    /// Comment text
    #[validate(length(min = 1, message = "comment body must not be empty"))]
    pub body: String,
}

impl Comment {
    /// Creates a comment authored by `user_id`
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        data: CreateComment,
    ) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, user_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, user_id, body, created_at, updated_at
            "#,
        )
        .bind(data.task_id)
        .bind(user_id)
        .bind(data.body)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Finds a comment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, user_id, body, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Replaces the comment text
    pub async fn update_body(
        pool: &PgPool,
        id: Uuid,
        body: String,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET body = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, task_id, user_id, body, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(body)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Deletes a comment
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a task's comments, oldest first
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, user_id, body, created_at, updated_at
            FROM comments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }
}
