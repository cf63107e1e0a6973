/// Authentication and authorization
///
/// - `google`: external identity verification contract and its Google
///   implementation
/// - `identity`: resolving verified identities and credentials to local
///   users
/// - `tokens`: access/refresh credential issuance
/// - `password`: hashing for the direct-registration path
/// - `authorization`: the membership-based access control evaluator
pub mod authorization;
pub mod google;
pub mod identity;
pub mod password;
pub mod tokens;

pub use authorization::{authorize, can, Action, Target};
pub use google::{GoogleVerifier, IdentityError, IdentityVerifier, VerifiedIdentity};
pub use identity::{login_with_google, register_user, resolve_or_create, TRUSTED_ISSUERS};
pub use tokens::{issue_pair, validate_token, Claims, TokenPair, TokenType};
