/// Identity resolution
///
/// Turns a verified external identity assertion into a local user record,
/// creating the account on first login and refreshing names on later
/// ones. Also carries the direct-registration path, which is the only
/// place a password hash is minted.
///
/// Only assertions from the fixed issuer allow-list are accepted; an
/// untrusted issuer never reaches the database.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::google::{IdentityError, IdentityVerifier, VerifiedIdentity};
use super::password::{hash_password, verify_password};
use super::tokens::{issue_pair, TokenPair};
use crate::error::{Error, Result};
use crate::models::user::{CreateUser, User};

/// Issuers whose identity assertions are accepted
pub const TRUSTED_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Checks the issuer against the allow-list
fn check_issuer(issuer: &str) -> std::result::Result<(), IdentityError> {
    if TRUSTED_ISSUERS.contains(&issuer) {
        Ok(())
    } else {
        Err(IdentityError::UntrustedIssuer(issuer.to_string()))
    }
}

/// Resolves a verified identity to a local user, creating it if absent
///
/// Existing accounts keep their stored names when the assertion carries
/// empty ones.
///
/// # Errors
///
/// Returns `Error::Identity` for an untrusted issuer, otherwise storage
/// errors.
pub async fn resolve_or_create(pool: &PgPool, identity: &VerifiedIdentity) -> Result<User> {
    check_issuer(&identity.issuer)?;

    let user = User::upsert_identity(
        pool,
        &identity.email,
        &identity.given_name,
        &identity.family_name,
    )
    .await?;

    info!(user_id = %user.id, "resolved external identity");
    Ok(user)
}

/// Full login flow: verify the token, resolve the user, issue credentials
///
/// # Errors
///
/// Returns `Error::Identity` when verification or issuer checks fail,
/// `Error::Token` when signing fails.
pub async fn login_with_google(
    pool: &PgPool,
    verifier: &dyn IdentityVerifier,
    token: &str,
    jwt_secret: &str,
) -> Result<(User, TokenPair)> {
    let identity = verifier.verify(token).await?;
    let user = resolve_or_create(pool, &identity).await?;
    let pair = issue_pair(user.id, jwt_secret)?;

    Ok((user, pair))
}

/// Registers a user directly with an email and password
///
/// # Errors
///
/// Returns `Error::Conflict` when the email is already registered,
/// `Error::Password` when hashing fails.
pub async fn register_user(
    pool: &PgPool,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User> {
    let password_hash = hash_password(password)?;

    let user = User::create(
        pool,
        CreateUser {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            password_hash: Some(password_hash),
        },
    )
    .await?;

    info!(user_id = %user.id, "registered user");
    Ok(user)
}

/// Checks an email/password pair and returns the user id on success
///
/// Accounts created through OAuth have no password and never match.
///
/// # Errors
///
/// Returns `Error::Forbidden` on a bad email or password; the two cases
/// are indistinguishable to the caller.
pub async fn verify_credentials(pool: &PgPool, email: &str, password: &str) -> Result<Uuid> {
    let user = User::find_by_email(pool, email)
        .await?
        .ok_or(Error::Forbidden("invalid credentials"))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or(Error::Forbidden("invalid credentials"))?;

    if !verify_password(password, hash)? {
        return Err(Error::Forbidden("invalid credentials"));
    }

    Ok(user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_issuers() {
        assert!(check_issuer("accounts.google.com").is_ok());
        assert!(check_issuer("https://accounts.google.com").is_ok());
    }

    #[test]
    fn test_untrusted_issuer_is_rejected() {
        let err = check_issuer("https://evil.example.com").unwrap_err();
        assert!(matches!(err, IdentityError::UntrustedIssuer(_)));

        // near misses do not pass
        assert!(check_issuer("accounts.google.com.attacker.io").is_err());
        assert!(check_issuer("http://accounts.google.com").is_err());
        assert!(check_issuer("").is_err());
    }
}
