//! The verified identity of a user and the trait for verifying bearer tokens.

use async_trait::async_trait;
use serde::Deserialize;

/// A user whose bearer token has been verified.
///
/// The email address is the owner key for all of a user's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The verified email address of the user.
    pub email: String,
    /// The user's display name, if the token carries one.
    pub name: Option<String>,
}

/// The errors that can occur while verifying a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The token is not valid, e.g. it is malformed, expired, or has a bad
    /// signature. The message is safe to show to the client.
    #[error("{0}")]
    Rejected(String),

    /// The token could not be checked, e.g. because the signing keys could
    /// not be fetched.
    #[error("could not verify token: {0}")]
    Unavailable(String),
}

/// Turns a bearer token into a verified [Identity].
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the identity it was issued for.
    ///
    /// # Errors
    /// Returns [VerifyError::Rejected] if the token is not valid, or
    /// [VerifyError::Unavailable] if verification could not be performed.
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}

/// The claims read from an identity token.
#[derive(Debug, Deserialize)]
pub(super) struct IdentityClaims {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl TryFrom<IdentityClaims> for Identity {
    type Error = VerifyError;

    fn try_from(claims: IdentityClaims) -> Result<Self, Self::Error> {
        let email = claims
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| VerifyError::Rejected("Token does not contain an email address".to_owned()))?;

        Ok(Identity {
            email,
            name: claims.name.filter(|name| !name.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Identity, IdentityClaims, VerifyError};

    #[test]
    fn claims_without_email_are_rejected() {
        let claims = IdentityClaims {
            email: None,
            name: Some("Alice".to_owned()),
        };

        assert!(matches!(
            Identity::try_from(claims),
            Err(VerifyError::Rejected(_))
        ));
    }

    #[test]
    fn empty_name_is_treated_as_missing() {
        let claims = IdentityClaims {
            email: Some("alice@example.com".to_owned()),
            name: Some(String::new()),
        };

        assert_eq!(
            Identity::try_from(claims),
            Ok(Identity {
                email: "alice@example.com".to_owned(),
                name: None,
            })
        );
    }
}
