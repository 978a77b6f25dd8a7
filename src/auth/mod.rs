//! Bearer-token authentication: verifying identity tokens and the middleware
//! that guards routes with them.

mod firebase;
mod identity;
mod middleware;
mod shared_secret;

pub use firebase::FirebaseVerifier;
pub use identity::{Identity, IdentityVerifier, VerifyError};
pub use middleware::identity_guard;
pub use shared_secret::SharedSecretVerifier;

#[cfg(test)]
pub use shared_secret::encode_test_token;
