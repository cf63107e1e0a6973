/// Database models
///
/// One module per entity. Each follows the same shape: the entity struct
/// derives `sqlx::FromRow`, input payloads are separate `CreateX`/`UpdateX`
/// structs, and database operations are async associated functions taking
/// a `&PgPool` (or a `&mut PgConnection` when they must join an open
/// transaction).
pub mod comment;
pub mod project;
pub mod sprint;
pub mod task;
pub mod user;

pub use comment::{Comment, CreateComment};
pub use project::{CreateProject, Project, ProjectMember, UpdateProject};
pub use sprint::{CreateSprint, Sprint, SprintStatus, UpdateSprint};
pub use task::{CreateTask, MoveTask, Task, TaskPriority, TaskStatus, UpdateTask};
pub use user::{CreateUser, User};
