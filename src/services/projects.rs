/// Project operations
///
/// Reads are open to any member; updates, deletion, and membership
/// administration belong to the owner alone.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization::{authorize, Action, Target};
use crate::error::{Error, Result};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::sprint::Sprint;
use crate::models::user::User;

/// A project with its members and sprints
///
/// The list projection is the bare [`Project`]; this is the explicit
/// expanded view for detail reads.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProjectDetail {
    /// The project itself
    pub project: Project,

    /// Owner and members
    pub members: Vec<User>,

    /// The project's sprints, most recent first
    pub sprints: Vec<Sprint>,
}

/// Creates a project owned by the principal
pub async fn create_project(
    pool: &PgPool,
    principal: Uuid,
    data: CreateProject,
) -> Result<Project> {
    data.validate()?;

    let project = Project::create(pool, principal, data).await?;
    info!(project_id = %project.id, "created project");

    Ok(project)
}

/// Fetches a project the principal can read
pub async fn get_project(pool: &PgPool, principal: Uuid, project_id: Uuid) -> Result<Project> {
    authorize(pool, principal, Action::Read, Target::Project(project_id)).await?;

    Project::find_by_id(pool, project_id)
        .await?
        .ok_or(Error::NotFound("project"))
}

/// Fetches a project with members and sprints
pub async fn project_detail(
    pool: &PgPool,
    principal: Uuid,
    project_id: Uuid,
) -> Result<ProjectDetail> {
    let project = get_project(pool, principal, project_id).await?;
    let members = Project::members(pool, project_id).await?;
    let sprints = Sprint::list_by_project(pool, project_id).await?;

    Ok(ProjectDetail {
        project,
        members,
        sprints,
    })
}

/// Lists the principal's projects (owned or joined)
pub async fn list_projects(pool: &PgPool, principal: Uuid) -> Result<Vec<Project>> {
    Ok(Project::list_for_user(pool, principal).await?)
}

/// Updates name or description; owner only
pub async fn update_project(
    pool: &PgPool,
    principal: Uuid,
    project_id: Uuid,
    data: UpdateProject,
) -> Result<Project> {
    data.validate()?;
    authorize(pool, principal, Action::Write, Target::Project(project_id)).await?;

    Project::update(pool, project_id, data)
        .await?
        .ok_or(Error::NotFound("project"))
}

/// Deletes a project and everything under it; owner only
pub async fn delete_project(pool: &PgPool, principal: Uuid, project_id: Uuid) -> Result<()> {
    authorize(pool, principal, Action::Delete, Target::Project(project_id)).await?;

    Project::delete(pool, project_id).await?;
    info!(%project_id, "deleted project");

    Ok(())
}
