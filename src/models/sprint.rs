/// Sprint model and database operations
///
/// A sprint is a time-boxed iteration within a project. Two invariants are
/// enforced at write time and backed by the schema:
///
/// - `end_date > start_date` (CHECK constraint `sprints_date_order`)
/// - at most one `active` sprint per project (partial unique index
///   `sprints_one_active_per_project`)
///
/// # State Machine
///
/// ```text
/// planning → active     (activation, exclusive per project)
/// planning → completed
/// active   → completed  (detaches unfinished tasks)
/// ```
///
/// `completed` is terminal.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE sprint_status AS ENUM ('planning', 'active', 'completed');
///
/// CREATE TABLE sprints (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(200) NOT NULL,
///     start_date DATE NOT NULL,
///     end_date DATE NOT NULL,
///     status sprint_status NOT NULL DEFAULT 'planning',
///     goal TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT sprints_date_order CHECK (end_date > start_date)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::ValidationError;

/// Sprint lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sprint_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    /// Being planned; the default for new sprints
    Planning,

    /// The project's current iteration; at most one per project
    Active,

    /// Finished; terminal
    Completed,
}

impl SprintStatus {
    /// Converts status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            SprintStatus::Planning => "planning",
            SprintStatus::Active => "active",
            SprintStatus::Completed => "completed",
        }
    }

    /// Checks if the status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, SprintStatus::Completed)
    }

    /// Checks if a transition to `target` is defined
    pub fn can_transition_to(&self, target: SprintStatus) -> bool {
        match (self, target) {
            (SprintStatus::Planning, SprintStatus::Active) => true,
            (SprintStatus::Planning, SprintStatus::Completed) => true,
            (SprintStatus::Active, SprintStatus::Completed) => true,
            _ => false,
        }
    }
}

impl FromStr for SprintStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(SprintStatus::Planning),
            "active" => Ok(SprintStatus::Active),
            "completed" => Ok(SprintStatus::Completed),
            other => Err(ValidationError::UnknownSprintStatus(other.to_string())),
        }
    }
}

/// Sprint record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sprint {
    /// Unique sprint ID
    pub id: Uuid,

    /// Parent project
    pub project_id: Uuid,

    /// Sprint name
    pub name: String,

    /// First day of the iteration
    pub start_date: NaiveDate,

    /// Last day of the iteration; must be after `start_date`
    pub end_date: NaiveDate,

    /// Lifecycle status
    pub status: SprintStatus,

    /// Sprint goal statement
    pub goal: String,

    /// When the sprint was created
    pub created_at: DateTime<Utc>,

    /// When the sprint was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a sprint; status always starts at planning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSprint {
    /// Parent project
    pub project_id: Uuid,

    /// Sprint name
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,

    /// First day of the iteration
    pub start_date: NaiveDate,

    /// Last day of the iteration
    pub end_date: NaiveDate,

    /// Sprint goal statement
    #[serde(default)]
    pub goal: String,
}

/// Input for updating a sprint; only present fields change
///
/// A status change through this payload is a plain field update: setting
/// `active` while a sibling is active is rejected, never auto-resolved.
/// The activation workflow is the only path that demotes siblings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSprint {
    /// New name
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: Option<String>,

    /// New start date
    pub start_date: Option<NaiveDate>,

    /// New end date
    pub end_date: Option<NaiveDate>,

    /// New status
    pub status: Option<SprintStatus>,

    /// New goal
    pub goal: Option<String>,
}

impl Sprint {
    /// Validates the date-ordering rule
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DateOrdering` when `end` is on or before
    /// `start`.
    pub fn validate_dates(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
        if end <= start {
            return Err(ValidationError::DateOrdering);
        }
        Ok(())
    }

    /// Creates a sprint in planning status
    ///
    /// Callers are expected to have validated the dates; the CHECK
    /// constraint is the last line of defense.
    pub async fn create(pool: &PgPool, data: CreateSprint) -> Result<Self, sqlx::Error> {
        let sprint = sqlx::query_as::<_, Sprint>(
            r#"
            INSERT INTO sprints (project_id, name, start_date, end_date, goal)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, project_id, name, start_date, end_date, status, goal,
                      created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.name)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.goal)
        .fetch_one(pool)
        .await?;

        Ok(sprint)
    }

    /// Finds a sprint by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sprint = sqlx::query_as::<_, Sprint>(
            r#"
            SELECT id, project_id, name, start_date, end_date, status, goal,
                   created_at, updated_at
            FROM sprints
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(sprint)
    }

    /// Applies a partial update
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateSprint,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sprint = sqlx::query_as::<_, Sprint>(
            r#"
            UPDATE sprints
            SET name = COALESCE($2, name),
                start_date = COALESCE($3, start_date),
                end_date = COALESCE($4, end_date),
                status = COALESCE($5, status),
                goal = COALESCE($6, goal),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, name, start_date, end_date, status, goal,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.status)
        .bind(data.goal)
        .fetch_optional(pool)
        .await?;

        Ok(sprint)
    }

    /// Deletes a sprint; its tasks are detached, not deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sprints WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists sprints of a project, most recent start first
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sprints = sqlx::query_as::<_, Sprint>(
            r#"
            SELECT id, project_id, name, start_date, end_date, status, goal,
                   created_at, updated_at
            FROM sprints
            WHERE project_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(sprints)
    }

    /// Demotes every active sprint of a project back to planning,
    /// excluding `except`
    ///
    /// This is the activation workflow's half of the single-active rule
    /// and runs inside the activation transaction. Returns the number of
    /// demoted sprints.
    pub async fn demote_active_siblings(
        conn: &mut PgConnection,
        project_id: Uuid,
        except: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sprints
            SET status = 'planning', updated_at = NOW()
            WHERE project_id = $1 AND status = 'active' AND id <> $2
            "#,
        )
        .bind(project_id)
        .bind(except)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Sets a sprint's status inside an open transaction
    ///
    /// Transition legality is the caller's concern; this only writes.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: SprintStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sprint = sqlx::query_as::<_, Sprint>(
            r#"
            UPDATE sprints
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, name, start_date, end_date, status, goal,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(sprint)
    }

    /// Finds the id of the active sprint in a project, excluding `except`
    ///
    /// Used by the direct-update path to reject a second active sprint.
    pub async fn find_active_sibling(
        pool: &PgPool,
        project_id: Uuid,
        except: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM sprints
            WHERE project_id = $1 AND status = 'active' AND id <> $2
            "#,
        )
        .bind(project_id)
        .bind(except)
        .fetch_optional(pool)
        .await?;

        Ok(id)
    }

    /// Percentage of the sprint's tasks that reached deployed status
    ///
    /// Returns 0 for an empty sprint.
    pub async fn completion_percentage(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
        let (total, deployed): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'deployed')
            FROM tasks
            WHERE sprint_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        if total == 0 {
            return Ok(0);
        }
        Ok(deployed * 100 / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(SprintStatus::Planning.as_str(), "planning");
        assert_eq!(SprintStatus::Active.as_str(), "active");
        assert_eq!(SprintStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "planning".parse::<SprintStatus>().unwrap(),
            SprintStatus::Planning
        );
        assert_eq!(
            "active".parse::<SprintStatus>().unwrap(),
            SprintStatus::Active
        );
        assert!("archived".parse::<SprintStatus>().is_err());
    }

    #[test]
    fn test_status_transitions() {
        assert!(SprintStatus::Planning.can_transition_to(SprintStatus::Active));
        assert!(SprintStatus::Planning.can_transition_to(SprintStatus::Completed));
        assert!(SprintStatus::Active.can_transition_to(SprintStatus::Completed));

        // completed is terminal
        assert!(!SprintStatus::Completed.can_transition_to(SprintStatus::Active));
        assert!(!SprintStatus::Completed.can_transition_to(SprintStatus::Planning));
        assert!(!SprintStatus::Completed.can_transition_to(SprintStatus::Completed));

        // no demotion outside the activation workflow
        assert!(!SprintStatus::Active.can_transition_to(SprintStatus::Planning));
    }

    #[test]
    fn test_terminal_status() {
        assert!(!SprintStatus::Planning.is_terminal());
        assert!(!SprintStatus::Active.is_terminal());
        assert!(SprintStatus::Completed.is_terminal());
    }

    #[test]
    fn test_date_ordering() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        assert!(Sprint::validate_dates(start, later).is_ok());

        // equal dates are rejected
        let err = Sprint::validate_dates(start, start).unwrap_err();
        assert_eq!(err.code(), "date_ordering");

        // reversed dates are rejected
        assert!(Sprint::validate_dates(later, start).is_err());
    }
}
