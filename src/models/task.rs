/// Task model and database operations
///
/// Tasks are the work items of a project. A task optionally belongs to a
/// sprint; a task with no sprint is "in the backlog". Deleting a sprint
/// detaches its tasks, and completing a sprint detaches every task that
/// has not reached deployed status.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('backlog', 'implementing', 'testing', 'deployed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     sprint_id UUID REFERENCES sprints(id) ON DELETE SET NULL,
///     title VARCHAR(300) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     status task_status NOT NULL DEFAULT 'backlog',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     story_points INTEGER,
///     sort_order INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::ValidationError;

/// Task board status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started
    Backlog,

    /// In development
    Implementing,

    /// In verification
    Testing,

    /// Shipped; survives sprint completion attached to its sprint
    Deployed,
}

impl TaskStatus {
    /// Converts status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Implementing => "implementing",
            TaskStatus::Testing => "testing",
            TaskStatus::Deployed => "deployed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(TaskStatus::Backlog),
            "implementing" => Ok(TaskStatus::Implementing),
            "testing" => Ok(TaskStatus::Testing),
            "deployed" => Ok(TaskStatus::Deployed),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority
    Low,

    /// Default priority
    Medium,

    /// High priority
    High,
}

impl TaskPriority {
    /// Converts priority to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Parent project
    pub project_id: Uuid,

    /// Sprint the task is scheduled in; None means backlog
    pub sprint_id: Option<Uuid>,

    /// Task title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Assigned user, if any
    pub assigned_to: Option<Uuid>,

    /// User who created the task; immutable
    pub created_by: Uuid,

    /// Board status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Estimate in story points
    pub story_points: Option<i32>,

    /// Manual sort key within a column
    pub sort_order: i32,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    /// Parent project
    pub project_id: Uuid,

    /// Sprint to schedule the task in; None leaves it in the backlog
    pub sprint_id: Option<Uuid>,

    /// Task title
    #[validate(length(min = 1, max = 300, message = "title must be 1-300 characters"))]
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Assigned user
    pub assigned_to: Option<Uuid>,

    /// Board status (defaults to backlog)
    #[serde(default = "default_status")]
    pub status: TaskStatus,

    /// Priority (defaults to medium)
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    /// Estimate in story points
    pub story_points: Option<i32>,

    /// Manual sort key (defaults to 0)
    #[serde(default)]
    pub sort_order: i32,
}

fn default_status() -> TaskStatus {
    TaskStatus::Backlog
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

/// Input for updating task fields; only present fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    /// New title
    #[validate(length(min = 1, max = 300, message = "title must be 1-300 characters"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New assignee (use Some(None) to unassign)
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,

    /// New estimate (use Some(None) to clear)
    #[serde(default, deserialize_with = "double_option")]
    pub story_points: Option<Option<i32>>,
}

/// Input for the board move operation
///
/// Any subset of the three fields may be supplied; absent fields are left
/// unchanged. The sprint field is tri-state: absent keeps the current
/// sprint, an explicit null detaches the task to the backlog, and an id
/// schedules it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveTask {
    /// New board status
    pub status: Option<TaskStatus>,

    /// New manual sort key
    pub sort_order: Option<i32>,

    /// New sprint (use Some(None) to move to the backlog)
    #[serde(default, deserialize_with = "double_option")]
    pub sprint: Option<Option<Uuid>>,
}

impl MoveTask {
    /// Checks if the patch changes anything at all
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.sort_order.is_none() && self.sprint.is_none()
    }
}

/// Keeps `null` distinguishable from an absent field during
/// deserialization
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced row does not exist or the
    /// database operation fails.
    pub async fn create(pool: &PgPool, created_by: Uuid, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, sprint_id, title, description, assigned_to,
                               created_by, status, priority, story_points, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, project_id, sprint_id, title, description, assigned_to,
                      created_by, status, priority, story_points, sort_order,
                      created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.sprint_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assigned_to)
        .bind(created_by)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.story_points)
        .bind(data.sort_order)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, sprint_id, title, description, assigned_to,
                   created_by, status, priority, story_points, sort_order,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies a partial field update
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the update statement from the fields that are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }
        if data.story_points.is_some() {
            bind_count += 1;
            query.push_str(&format!(", story_points = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, project_id, sprint_id, title, description, \
             assigned_to, created_by, status, priority, story_points, sort_order, \
             created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(story_points) = data.story_points {
            q = q.bind(story_points);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Applies a board move inside an open transaction
    ///
    /// The caller validates the patch first; this only writes it.
    pub async fn apply_move(
        conn: &mut PgConnection,
        id: Uuid,
        data: &MoveTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.sort_order.is_some() {
            bind_count += 1;
            query.push_str(&format!(", sort_order = ${}", bind_count));
        }
        if data.sprint.is_some() {
            bind_count += 1;
            query.push_str(&format!(", sprint_id = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, project_id, sprint_id, title, description, \
             assigned_to, created_by, status, priority, story_points, sort_order, \
             created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(sort_order) = data.sort_order {
            q = q.bind(sort_order);
        }
        if let Some(sprint) = data.sprint {
            q = q.bind(sprint);
        }

        let task = q.fetch_optional(&mut *conn).await?;

        Ok(task)
    }

    /// Detaches every task of a sprint that has not reached deployed
    ///
    /// Statuses are left untouched. Runs inside the caller's transaction
    /// so the detachment commits together with the sprint's status flip.
    ///
    /// Returns the number of detached tasks.
    pub async fn detach_unfinished(
        conn: &mut PgConnection,
        sprint_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET sprint_id = NULL, updated_at = NOW()
            WHERE sprint_id = $1 AND status <> 'deployed'
            "#,
        )
        .bind(sprint_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a task and its comments
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a project's tasks in board order
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, sprint_id, title, description, assigned_to,
                   created_by, status, priority, story_points, sort_order,
                   created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY sort_order ASC, created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists a sprint's tasks in board order
    pub async fn list_by_sprint(pool: &PgPool, sprint_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, sprint_id, title, description, assigned_to,
                   created_by, status, priority, story_points, sort_order,
                   created_at, updated_at
            FROM tasks
            WHERE sprint_id = $1
            ORDER BY sort_order ASC, created_at DESC
            "#,
        )
        .bind(sprint_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists a project's backlog (tasks with no sprint)
    pub async fn list_backlog(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, sprint_id, title, description, assigned_to,
                   created_by, status, priority, story_points, sort_order,
                   created_at, updated_at
            FROM tasks
            WHERE project_id = $1 AND sprint_id IS NULL
            ORDER BY sort_order ASC, created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Backlog.as_str(), "backlog");
        assert_eq!(TaskStatus::Implementing.as_str(), "implementing");
        assert_eq!(TaskStatus::Testing.as_str(), "testing");
        assert_eq!(TaskStatus::Deployed.as_str(), "deployed");
    }

    #[test]
    fn test_status_parse_rejects_unknown_values() {
        assert_eq!(
            "testing".parse::<TaskStatus>().unwrap(),
            TaskStatus::Testing
        );

        let err = "done".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.code(), "unknown_status");
    }

    #[test]
    fn test_priority_parse_rejects_unknown_values() {
        assert_eq!(
            "high".parse::<TaskPriority>().unwrap(),
            TaskPriority::High
        );

        let err = "urgent".parse::<TaskPriority>().unwrap_err();
        assert_eq!(err.code(), "unknown_priority");
    }

    #[test]
    fn test_create_task_defaults() {
        let json = r#"{"project_id": "00000000-0000-0000-0000-000000000001", "title": "Ship it"}"#;
        let data: CreateTask = serde_json::from_str(json).unwrap();
        assert_eq!(data.status, TaskStatus::Backlog);
        assert_eq!(data.priority, TaskPriority::Medium);
        assert_eq!(data.sort_order, 0);
        assert!(data.sprint_id.is_none());
    }

    #[test]
    fn test_move_patch_sprint_tristate() {
        // absent field leaves the sprint unchanged
        let patch: MoveTask = serde_json::from_str(r#"{"status": "testing"}"#).unwrap();
        assert!(patch.sprint.is_none());
        assert!(!patch.is_empty());

        // explicit null detaches to the backlog
        let patch: MoveTask = serde_json::from_str(r#"{"sprint": null}"#).unwrap();
        assert_eq!(patch.sprint, Some(None));

        // an id schedules the task
        let patch: MoveTask =
            serde_json::from_str(r#"{"sprint": "00000000-0000-0000-0000-000000000002"}"#).unwrap();
        assert!(matches!(patch.sprint, Some(Some(_))));

        // nothing supplied at all
        let patch: MoveTask = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_update_task_clearing_fields() {
        let patch: UpdateTask =
            serde_json::from_str(r#"{"assigned_to": null, "story_points": null}"#).unwrap();
        assert_eq!(patch.assigned_to, Some(None));
        assert_eq!(patch.story_points, Some(None));

        let patch: UpdateTask = serde_json::from_str("{}").unwrap();
        assert!(patch.assigned_to.is_none());
        assert!(patch.story_points.is_none());
    }
}
