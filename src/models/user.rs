/// User model and database operations
///
/// Users are identity records. Accounts arrive through two paths: direct
/// registration (with a password hash) and OAuth resolution (no password,
/// keyed by email). Email is the natural key for OAuth-linked accounts.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     first_name VARCHAR(150) NOT NULL DEFAULT '',
///     last_name VARCHAR(150) NOT NULL DEFAULT '',
///     password_hash TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User identity record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique across the system
    pub email: String,

    /// Given name; empty when the identity provider supplied none
    pub first_name: String,

    /// Family name; empty when the identity provider supplied none
    pub last_name: String,

    /// Argon2id hash; None for OAuth-only accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user directly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Given name
    #[serde(default)]
    pub first_name: String,

    /// Family name
    #[serde(default)]
    pub last_name: String,

    /// Argon2id password hash (never a plaintext password)
    pub password_hash: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered (unique
    /// constraint) or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, first_name, last_name, password_hash, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Gets or creates a user for a verified external identity
    ///
    /// An existing account keeps its stored names when the incoming values
    /// are empty; non-empty values refresh them. The upsert is a single
    /// statement, so two concurrent logins for a new email cannot create
    /// two rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert_identity(
        pool: &PgPool,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, first_name, last_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET
                first_name = CASE
                    WHEN EXCLUDED.first_name <> '' THEN EXCLUDED.first_name
                    ELSE users.first_name
                END,
                last_name = CASE
                    WHEN EXCLUDED.last_name <> '' THEN EXCLUDED.last_name
                    ELSE users.last_name
                END,
                updated_at = NOW()
            RETURNING id, email, first_name, last_name, password_hash, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user
    ///
    /// Owned projects, created tasks, and comments cascade away; task
    /// assignments are cleared.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
