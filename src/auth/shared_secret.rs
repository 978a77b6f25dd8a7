//! Verifies identity tokens signed with a secret shared with the token issuer.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::auth::identity::{Identity, IdentityClaims, IdentityVerifier, VerifyError};

/// Verifies HS256 JSON Web Tokens that carry an `email` claim and optionally a
/// `name` claim.
#[derive(Clone)]
pub struct SharedSecretVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SharedSecretVerifier {
    /// Create a verifier for tokens signed with `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let token_data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|error| VerifyError::Rejected(error.to_string()))?;

        Identity::try_from(token_data.claims)
    }
}

/// Sign a token for `email` that expires in `expires_in_seconds` (negative for
/// a token that has already expired).
#[cfg(test)]
pub fn encode_test_token(
    secret: &str,
    email: &str,
    name: Option<&str>,
    expires_in_seconds: i64,
) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use time::OffsetDateTime;

    let exp = OffsetDateTime::now_utc().unix_timestamp() + expires_in_seconds;
    let claims = json!({ "email": email, "name": name, "exp": exp });

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("could not encode test token")
}
