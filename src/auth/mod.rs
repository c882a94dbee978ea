//! Authentication: credential checks and bearer token issuance.

mod credentials;
mod token;

pub use credentials::{CredentialVerifier, Principal, Role, StaticCredentials};
pub use token::{unverified_expiry, AuthError, Claims, TokenIssuer};
