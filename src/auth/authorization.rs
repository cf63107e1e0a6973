/// Membership-based access control
///
/// Every entity is governed by a project: a sprint or task through its
/// `project_id`, a comment through its task's project. Authorization is a
/// two-step evaluation: load the facts relating the principal to the
/// target (fresh on every call, because membership can change between
/// requests), then apply a pure policy function over them.
///
/// # Policy
///
/// | Target  | read   | write/delete                     | manage members |
/// |---------|--------|----------------------------------|----------------|
/// | Project | member | owner                            | owner          |
/// | Sprint  | member | member                           | never          |
/// | Task    | member | creator, assignee, project owner | never          |
/// | Comment | member | author                           | never          |
///
/// "Member" always includes the project owner.
///
/// # Example
///
/// ```no_run
/// use sprintboard::auth::authorization::{authorize, Action, Target};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user: Uuid, project: Uuid) -> sprintboard::Result<()> {
/// authorize(&pool, user, Action::Delete, Target::Project(project)).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::comment::Comment;
use crate::models::project::Project;
use crate::models::sprint::Sprint;
use crate::models::task::Task;

/// Operations a principal can attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// View the entity
    Read,

    /// Modify the entity
    Write,

    /// Remove the entity
    Delete,

    /// Change the project's member set
    ManageMembers,
}

/// The entity an operation is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A project
    Project(Uuid),

    /// A sprint
    Sprint(Uuid),

    /// A task
    Task(Uuid),

    /// A comment
    Comment(Uuid),
}

/// Relations between a principal and a target, resolved against current
/// storage state
///
/// `is_member` always includes the governing project's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFacts {
    /// Facts about a project target
    Project {
        /// Principal owns the project
        is_owner: bool,
        /// Principal is owner or member
        is_member: bool,
    },

    /// Facts about a sprint target
    Sprint {
        /// Principal is owner or member of the sprint's project
        is_member: bool,
    },

    /// Facts about a task target
    Task {
        /// Principal owns the task's project
        is_project_owner: bool,
        /// Principal is owner or member of the task's project
        is_member: bool,
        /// Principal created the task
        is_creator: bool,
        /// Principal is assigned to the task
        is_assignee: bool,
    },

    /// Facts about a comment target
    Comment {
        /// Principal is owner or member of the comment's project
        is_member: bool,
        /// Principal wrote the comment
        is_author: bool,
    },
}

/// Pure policy decision over resolved facts
///
/// Read access is always at least as broad as write access.
pub fn permits(action: Action, facts: &TargetFacts) -> bool {
    match facts {
        TargetFacts::Project { is_owner, is_member } => match action {
            Action::Read => *is_member,
            Action::Write | Action::Delete | Action::ManageMembers => *is_owner,
        },
        TargetFacts::Sprint { is_member } => match action {
            Action::Read | Action::Write | Action::Delete => *is_member,
            Action::ManageMembers => false,
        },
        TargetFacts::Task {
            is_project_owner,
            is_member,
            is_creator,
            is_assignee,
        } => match action {
            Action::Read => *is_member,
            Action::Write | Action::Delete => *is_creator || *is_assignee || *is_project_owner,
            Action::ManageMembers => false,
        },
        TargetFacts::Comment { is_member, is_author } => match action {
            Action::Read => *is_member,
            Action::Write | Action::Delete => *is_author,
            Action::ManageMembers => false,
        },
    }
}

/// Resolves the facts relating `principal` to `target`
///
/// # Errors
///
/// Returns `Error::NotFound` when the target id (or its parent chain)
/// does not resolve.
pub async fn load_facts(pool: &PgPool, principal: Uuid, target: Target) -> Result<TargetFacts> {
    match target {
        Target::Project(id) => {
            let project = Project::find_by_id(pool, id)
                .await?
                .ok_or(Error::NotFound("project"))?;

            let is_owner = project.owner_id == principal;
            let is_member = is_owner || Project::has_member(pool, id, principal).await?;

            Ok(TargetFacts::Project { is_owner, is_member })
        }
        Target::Sprint(id) => {
            let sprint = Sprint::find_by_id(pool, id)
                .await?
                .ok_or(Error::NotFound("sprint"))?;

            let is_member =
                Project::is_member_or_owner(pool, sprint.project_id, principal).await?;

            Ok(TargetFacts::Sprint { is_member })
        }
        Target::Task(id) => {
            let task = Task::find_by_id(pool, id)
                .await?
                .ok_or(Error::NotFound("task"))?;
            let project = Project::find_by_id(pool, task.project_id)
                .await?
                .ok_or(Error::NotFound("project"))?;

            let is_project_owner = project.owner_id == principal;
            let is_member = is_project_owner
                || Project::has_member(pool, task.project_id, principal).await?;

            Ok(TargetFacts::Task {
                is_project_owner,
                is_member,
                is_creator: task.created_by == principal,
                is_assignee: task.assigned_to == Some(principal),
            })
        }
        Target::Comment(id) => {
            let comment = Comment::find_by_id(pool, id)
                .await?
                .ok_or(Error::NotFound("comment"))?;
            let task = Task::find_by_id(pool, comment.task_id)
                .await?
                .ok_or(Error::NotFound("task"))?;

            let is_member = Project::is_member_or_owner(pool, task.project_id, principal).await?;

            Ok(TargetFacts::Comment {
                is_member,
                is_author: comment.user_id == principal,
            })
        }
    }
}

/// Checks whether the principal may perform the action
///
/// # Errors
///
/// Returns `Error::NotFound` when the target does not resolve; storage
/// errors pass through.
pub async fn can(pool: &PgPool, principal: Uuid, action: Action, target: Target) -> Result<bool> {
    let facts = load_facts(pool, principal, target).await?;
    Ok(permits(action, &facts))
}

/// Requires permission, failing with `Error::Forbidden` otherwise
pub async fn authorize(
    pool: &PgPool,
    principal: Uuid,
    action: Action,
    target: Target,
) -> Result<()> {
    if can(pool, principal, action, target).await? {
        Ok(())
    } else {
        Err(Error::Forbidden("not permitted on this resource"))
    }
}

/// Requires that the user is owner or member of the project
///
/// Used by creation paths, where no target entity exists yet.
pub async fn require_member(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<()> {
    let project = Project::find_by_id(pool, project_id)
        .await?
        .ok_or(Error::NotFound("project"))?;

    if project.owner_id == user_id || Project::has_member(pool, project_id, user_id).await? {
        Ok(())
    } else {
        Err(Error::Forbidden("not a member of this project"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_facts(is_owner: bool, is_member: bool) -> TargetFacts {
        TargetFacts::Project { is_owner, is_member }
    }

    #[test]
    fn test_project_policy() {
        let owner = project_facts(true, true);
        let member = project_facts(false, true);
        let outsider = project_facts(false, false);

        assert!(permits(Action::Read, &owner));
        assert!(permits(Action::Write, &owner));
        assert!(permits(Action::Delete, &owner));
        assert!(permits(Action::ManageMembers, &owner));

        // members read but never administer
        assert!(permits(Action::Read, &member));
        assert!(!permits(Action::Write, &member));
        assert!(!permits(Action::Delete, &member));
        assert!(!permits(Action::ManageMembers, &member));

        assert!(!permits(Action::Read, &outsider));
        assert!(!permits(Action::Delete, &outsider));
    }

    #[test]
    fn test_sprint_policy() {
        let member = TargetFacts::Sprint { is_member: true };
        let outsider = TargetFacts::Sprint { is_member: false };

        assert!(permits(Action::Read, &member));
        assert!(permits(Action::Write, &member));
        assert!(permits(Action::Delete, &member));
        assert!(!permits(Action::ManageMembers, &member));

        assert!(!permits(Action::Read, &outsider));
        assert!(!permits(Action::Write, &outsider));
    }

    #[test]
    fn test_task_policy() {
        let creator = TargetFacts::Task {
            is_project_owner: false,
            is_member: true,
            is_creator: true,
            is_assignee: false,
        };
        let assignee = TargetFacts::Task {
            is_project_owner: false,
            is_member: true,
            is_creator: false,
            is_assignee: true,
        };
        let project_owner = TargetFacts::Task {
            is_project_owner: true,
            is_member: true,
            is_creator: false,
            is_assignee: false,
        };
        let bystander = TargetFacts::Task {
            is_project_owner: false,
            is_member: true,
            is_creator: false,
            is_assignee: false,
        };

        for facts in [&creator, &assignee, &project_owner] {
            assert!(permits(Action::Write, facts));
            assert!(permits(Action::Delete, facts));
        }

        // any member reads, uninvolved members cannot write
        assert!(permits(Action::Read, &bystander));
        assert!(!permits(Action::Write, &bystander));
        assert!(!permits(Action::Delete, &bystander));
    }

    #[test]
    fn test_comment_policy() {
        let author = TargetFacts::Comment {
            is_member: true,
            is_author: true,
        };
        let member = TargetFacts::Comment {
            is_member: true,
            is_author: false,
        };
        let outsider = TargetFacts::Comment {
            is_member: false,
            is_author: false,
        };

        assert!(permits(Action::Read, &author));
        assert!(permits(Action::Write, &author));
        assert!(permits(Action::Delete, &author));

        assert!(permits(Action::Read, &member));
        assert!(!permits(Action::Write, &member));
        assert!(!permits(Action::Delete, &member));

        assert!(!permits(Action::Read, &outsider));
    }

    #[test]
    fn test_reads_are_broader_than_writes() {
        // every facts shape that can write can also read
        let shapes = [
            project_facts(true, true),
            TargetFacts::Sprint { is_member: true },
            TargetFacts::Task {
                is_project_owner: false,
                is_member: true,
                is_creator: true,
                is_assignee: false,
            },
            TargetFacts::Comment {
                is_member: true,
                is_author: true,
            },
        ];

        for facts in &shapes {
            if permits(Action::Write, facts) {
                assert!(permits(Action::Read, facts));
            }
        }
    }
}
