/// External identity verification
///
/// The system never inspects Google ID tokens itself; it hands them to
/// Google's tokeninfo endpoint, which either vouches for the token and
/// returns its claims or rejects it. The [`IdentityVerifier`] trait is
/// the seam: the identity resolver takes any implementation, so tests
/// substitute a stub and never touch the network.
///
/// # Example
///
/// ```no_run
/// use sprintboard::auth::google::{GoogleVerifier, IdentityVerifier};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = GoogleVerifier::new("client-id.apps.googleusercontent.com".to_string());
/// let identity = verifier.verify("eyJhbGciOi...").await?;
/// println!("verified {}", identity.email);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::Deserialize;

/// Error type for identity verification
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider rejected the token
    #[error("identity token rejected: {0}")]
    InvalidToken(String),

    /// The token was minted for a different client
    #[error("identity token audience mismatch")]
    WrongAudience,

    /// The asserted issuer is not on the allow-list
    #[error("untrusted identity issuer `{0}`")]
    UntrustedIssuer(String),

    /// The provider did not supply an email address
    #[error("identity assertion carries no email")]
    MissingEmail,

    /// The verification call itself failed
    #[error("identity provider unreachable: {0}")]
    Upstream(String),
}

/// A verified external identity assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Email address attested by the provider
    pub email: String,

    /// Given name; empty when the provider supplied none
    pub given_name: String,

    /// Family name; empty when the provider supplied none
    pub family_name: String,

    /// Issuer string as asserted by the provider
    pub issuer: String,
}

/// Contract for turning an opaque token into a verified identity
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies the token and returns its identity claims
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] when the token is invalid, expired,
    /// minted for another client, or the provider cannot be reached.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Claims returned by Google's tokeninfo endpoint (all values arrive as
/// strings)
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    iss: String,
    email: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

/// Verifier backed by Google's tokeninfo endpoint
///
/// The endpoint validates signature and expiry server-side; this client
/// only checks that the token was minted for our OAuth client.
pub struct GoogleVerifier {
    http: reqwest::Client,
    client_id: String,
    endpoint: String,
}

impl GoogleVerifier {
    /// Default tokeninfo endpoint
    pub const TOKENINFO_URL: &'static str = "https://oauth2.googleapis.com/tokeninfo";

    /// Creates a verifier for the given OAuth client id
    pub fn new(client_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            endpoint: Self::TOKENINFO_URL.to_string(),
        }
    }

    /// Creates a verifier against a non-default endpoint (test servers)
    pub fn with_endpoint(client_id: String, endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            endpoint,
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::InvalidToken(format!(
                "tokeninfo returned {}",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if info.aud != self.client_id {
            return Err(IdentityError::WrongAudience);
        }

        let email = info.email.ok_or(IdentityError::MissingEmail)?;

        Ok(VerifiedIdentity {
            email,
            given_name: info.given_name.unwrap_or_default(),
            family_name: info.family_name.unwrap_or_default(),
            issuer: info.iss,
        })
    }
}
