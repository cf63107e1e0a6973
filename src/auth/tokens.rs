/// Session credential issuance
///
/// Once a user is resolved, the caller receives an access/refresh token
/// pair. Tokens are HS256-signed JWTs; the signing and verification
/// mechanics belong to the `jsonwebtoken` library, this module only
/// defines the claim layout and lifetimes.
///
/// # Token Types
///
/// - **Access**: 24 hours, authenticates API requests
/// - **Refresh**: 30 days, exchanged for a fresh access token
///
/// # Example
///
/// ```
/// use sprintboard::auth::tokens::{issue_pair, validate_token, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "0123456789abcdef0123456789abcdef";
/// let user_id = Uuid::new_v4();
///
/// let pair = issue_pair(user_id, secret)?;
/// let claims = validate_token(&pair.access_token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// assert_eq!(claims.token_type, TokenType::Access);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped into every token
pub const ISSUER: &str = "sprintboard";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signing failed
    #[error("failed to create token: {0}")]
    Create(String),

    /// Signature, expiry, or issuer check failed
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Token is past its expiry
    #[error("token has expired")]
    Expired,
}

/// Token kind carried in the claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived API credential
    Access,

    /// Long-lived renewal credential
    Refresh,
}

impl TokenType {
    /// Lifetime for this token kind
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID
    pub sub: Uuid,

    /// Issuer
    pub iss: String,

    /// Issued-at (unix seconds)
    pub iat: i64,

    /// Expiry (unix seconds)
    pub exp: i64,

    /// Access or refresh
    pub token_type: TokenType,
}

impl Claims {
    /// Builds claims for a user with the kind's default lifetime
    pub fn new(user_id: Uuid, token_type: TokenType) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + token_type.lifetime()).timestamp(),
            token_type,
        }
    }
}

/// An access/refresh credential pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived API credential
    pub access_token: String,

    /// Long-lived renewal credential
    pub refresh_token: String,
}

/// Signs a single token for the given claims
///
/// # Errors
///
/// Returns `TokenError::Create` if signing fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Create(e.to_string()))
}

/// Issues the access/refresh pair for a resolved user
///
/// # Errors
///
/// Returns `TokenError::Create` if signing fails.
pub fn issue_pair(user_id: Uuid, secret: &str) -> Result<TokenPair, TokenError> {
    let access = create_token(&Claims::new(user_id, TokenType::Access), secret)?;
    let refresh = create_token(&Claims::new(user_id, TokenType::Refresh), secret)?;

    Ok(TokenPair {
        access_token: access,
        refresh_token: refresh,
    })
}

/// Validates a token's signature, expiry, and issuer
///
/// # Errors
///
/// Returns `TokenError::Expired` for expired tokens and
/// `TokenError::Invalid` for everything else.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough";

    #[test]
    fn test_pair_round_trip() {
        let user_id = Uuid::new_v4();
        let pair = issue_pair(user_id, SECRET).unwrap();

        let access = validate_token(&pair.access_token, SECRET).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(access.iss, ISSUER);

        let refresh = validate_token(&pair.refresh_token, SECRET).unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let pair = issue_pair(Uuid::new_v4(), SECRET).unwrap();
        let err = validate_token(&pair.access_token, "another-secret-key-entirely-xx").unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        claims.iat -= 100_000;
        claims.exp = claims.iat + 1;

        let token = create_token(&claims, SECRET).unwrap();
        let err = validate_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        claims.iss = "someone-else".to_string();

        let token = create_token(&claims, SECRET).unwrap();
        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_lifetimes() {
        assert_eq!(TokenType::Access.lifetime(), Duration::hours(24));
        assert_eq!(TokenType::Refresh.lifetime(), Duration::days(30));
    }
}
