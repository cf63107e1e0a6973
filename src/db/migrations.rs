/// Database migration runner
///
/// Migrations live in the `migrations/` directory at the crate root as
/// reversible `.up.sql`/`.down.sql` pairs and are embedded into the binary
/// with `sqlx::migrate!`.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{info, warn};

/// Creates the target database if it does not exist yet
///
/// Useful for test setups and first runs; production databases are
/// normally provisioned out of band.
///
/// # Errors
///
/// Returns an error if the server is unreachable or the caller lacks
/// create privileges.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("database does not exist, creating");
        Postgres::create_database(database_url).await?;
    }
    Ok(())
}

/// Runs all pending migrations
///
/// Each migration runs in its own transaction; a failing migration rolls
/// back and surfaces the error.
///
/// # Errors
///
/// Returns an error if a migration file fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("running database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("migrations up to date");
            Ok(())
        }
        Err(e) => {
            warn!("migration failed: {}", e);
            Err(e)
        }
    }
}
