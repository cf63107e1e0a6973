/// Error types shared by every operation in the crate
///
/// All service operations return `Result<T, Error>`. Authorization and
/// validation failures are recovered at the operation boundary and carry a
/// machine-readable code; storage failures stay opaque so that database
/// details never leak past this module.
///
/// # Example
///
/// ```
/// use sprintboard::error::{Error, ValidationError};
///
/// let err = Error::Validation(ValidationError::DateOrdering);
/// assert_eq!(err.code(), "date_ordering");
/// ```

use uuid::Uuid;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Unified operation error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity id does not resolve
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The principal is not permitted to perform the operation
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// A domain rule was violated; nothing was written
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A concurrent writer won the race for a uniqueness constraint
    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// The external identity assertion could not be accepted
    #[error(transparent)]
    Identity(#[from] crate::auth::google::IdentityError),

    /// Credential issuance or validation failed
    #[error(transparent)]
    Token(#[from] crate::auth::tokens::TokenError),

    /// Password hashing or verification failed
    #[error(transparent)]
    Password(#[from] crate::auth::password::PasswordError),

    /// Unexpected storage failure; details are logged, not surfaced
    #[error("internal storage error")]
    Database(#[source] sqlx::Error),
}

impl Error {
    /// Convenience constructor for missing-entity errors
    pub fn not_found(entity: &'static str) -> Self {
        Error::NotFound(entity)
    }

    /// Machine-readable error code for clients
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Forbidden(_) => "forbidden",
            Error::Validation(v) => v.code(),
            Error::Conflict(_) => "conflict",
            Error::Identity(_) => "upstream_identity_error",
            Error::Token(_) => "invalid_token",
            Error::Password(_) => "internal_error",
            Error::Database(_) => "internal_error",
        }
    }
}

/// Domain rule violations, each with a stable reason code
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Sprint end date is not after its start date
    #[error("end date must be after start date")]
    DateOrdering,

    /// Another sprint in the project already has active status
    #[error("only one active sprint is allowed per project")]
    DuplicateActiveSprint,

    /// The requested sprint status change is not a defined transition
    #[error("sprint cannot move from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Task status value outside the enumerated domain
    #[error("unknown task status `{0}`")]
    UnknownStatus(String),

    /// Task priority value outside the enumerated domain
    #[error("unknown task priority `{0}`")]
    UnknownPriority(String),

    /// Sprint status value outside the enumerated domain
    #[error("unknown sprint status `{0}`")]
    UnknownSprintStatus(String),

    /// The project owner cannot be removed from the member set
    #[error("the project owner cannot be removed from the project")]
    OwnerRemoval,

    /// A task may only be placed in a sprint of its own project
    #[error("sprint {sprint_id} does not belong to the task's project")]
    SprintProjectMismatch { sprint_id: Uuid },

    /// Field-level input validation failed
    #[error("invalid input: {0}")]
    Input(#[source] validator::ValidationErrors),
}

impl ValidationError {
    /// Stable reason code for this violation
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::DateOrdering => "date_ordering",
            ValidationError::DuplicateActiveSprint => "duplicate_active_sprint",
            ValidationError::InvalidTransition { .. } => "invalid_transition",
            ValidationError::UnknownStatus(_) => "unknown_status",
            ValidationError::UnknownPriority(_) => "unknown_priority",
            ValidationError::UnknownSprintStatus(_) => "unknown_sprint_status",
            ValidationError::OwnerRemoval => "owner_removal",
            ValidationError::SprintProjectMismatch { .. } => "sprint_project_mismatch",
            ValidationError::Input(_) => "invalid_input",
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::Validation(ValidationError::Input(err))
    }
}

/// Maps storage errors onto the taxonomy. Unique-index violations from
/// concurrent sprint activation become `Conflict`; everything else stays
/// an opaque database error.
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(constraint) = db_err.constraint() {
                if constraint == "sprints_one_active_per_project" {
                    return Error::Conflict("a concurrent activation already won");
                }
                if constraint == "users_email_key" {
                    return Error::Conflict("email is already registered");
                }
            }
        }
        Error::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::NotFound("project").code(), "not_found");
        assert_eq!(Error::Forbidden("no access").code(), "forbidden");
        assert_eq!(Error::Conflict("raced").code(), "conflict");
        assert_eq!(
            Error::Validation(ValidationError::DuplicateActiveSprint).code(),
            "duplicate_active_sprint"
        );
    }

    #[test]
    fn test_validation_codes_are_stable() {
        assert_eq!(ValidationError::DateOrdering.code(), "date_ordering");
        assert_eq!(
            ValidationError::InvalidTransition {
                from: "completed",
                to: "active"
            }
            .code(),
            "invalid_transition"
        );
        assert_eq!(
            ValidationError::UnknownStatus("done".to_string()).code(),
            "unknown_status"
        );
        assert_eq!(ValidationError::OwnerRemoval.code(), "owner_removal");
        assert_eq!(
            ValidationError::SprintProjectMismatch {
                sprint_id: Uuid::new_v4()
            }
            .code(),
            "sprint_project_mismatch"
        );
    }

    #[test]
    fn test_display_messages() {
        let err = Error::Validation(ValidationError::DateOrdering);
        assert_eq!(err.to_string(), "end date must be after start date");

        let err = Error::NotFound("sprint");
        assert_eq!(err.to_string(), "sprint not found");
    }

    #[test]
    fn test_database_error_is_opaque() {
        let err = Error::Database(sqlx::Error::PoolClosed);
        assert_eq!(err.to_string(), "internal storage error");
    }
}
