/// Configuration loaded from environment variables
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for token signing (required, min 32 bytes)
/// - `GOOGLE_CLIENT_ID`: OAuth client id accepted as token audience (required)
///
/// # Example
///
/// ```no_run
/// use sprintboard::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("pool size: {}", config.database.max_connections);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseSettings,

    /// Token signing configuration
    pub jwt: JwtSettings,

    /// Google OAuth configuration
    pub google: GoogleSettings,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of pooled connections
    pub max_connections: u32,
}

/// Token signing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    /// Secret key for HS256 signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Google OAuth settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSettings {
    /// OAuth client id; verified identity tokens must carry it as audience
    pub client_id: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// Reads a `.env` file first when present, then the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or unparsable.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 bytes");
        }

        let google_client_id = env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("GOOGLE_CLIENT_ID must be set"))?;

        Ok(Config {
            database: DatabaseSettings {
                url: database_url,
                max_connections,
            },
            jwt: JwtSettings { secret: jwt_secret },
            google: GoogleSettings {
                client_id: google_client_id,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_roundtrip_serde() {
        let config = Config {
            database: DatabaseSettings {
                url: "postgresql://localhost/sprintboard".to_string(),
                max_connections: 5,
            },
            jwt: JwtSettings {
                secret: "0123456789abcdef0123456789abcdef".to_string(),
            },
            google: GoogleSettings {
                client_id: "client-id.apps.googleusercontent.com".to_string(),
            },
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.database.max_connections, 5);
        assert_eq!(back.google.client_id, config.google.client_id);
    }
}
