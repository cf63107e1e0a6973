/// Request-level operations
///
/// Every mutation here runs the same explicit pipeline: authorize the
/// principal, validate the candidate state, then apply the write (and any
/// side effects) in a single transaction. A failure at any step surfaces
/// as a structured error and leaves nothing behind.
pub mod comments;
pub mod membership;
pub mod projects;
pub mod sprints;
pub mod tasks;

pub use comments::{create_comment, delete_comment, list_comments, update_comment};
pub use membership::{add_member, remove_member};
pub use projects::{
    create_project, delete_project, get_project, list_projects, project_detail, update_project,
    ProjectDetail,
};
pub use sprints::{
    activate_sprint, complete_sprint, create_sprint, delete_sprint, get_sprint, sprint_detail,
    update_sprint, SprintDetail,
};
pub use tasks::{
    create_task, delete_task, get_task, list_backlog, list_project_tasks, move_task, task_detail,
    update_task, TaskDetail,
};
