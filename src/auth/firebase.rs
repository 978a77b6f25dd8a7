//! Verifies Firebase ID tokens against Google's published signing keys.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header, jwk::JwkSet};
use tokio::sync::RwLock;

use crate::auth::identity::{Identity, IdentityClaims, IdentityVerifier, VerifyError};

/// Where Google publishes the keys that sign Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// How long fetched signing keys are trusted before they are fetched again.
const KEY_SET_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Tokens naming an unknown key only trigger a fetch if the cached keys are
/// at least this old.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

struct CachedKeySet {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies RS256 ID tokens issued by Firebase Authentication for one project.
///
/// The token must be signed by one of Google's current keys, have the project
/// ID as its audience and `https://securetoken.google.com/<project ID>` as its
/// issuer. Keys are fetched on first use and cached for an hour, or until a
/// token names a key that is not in the cache. Unknown keys cause at most one
/// fetch per minute.
pub struct FirebaseVerifier {
    client: reqwest::Client,
    jwks_url: String,
    validation: Validation,
    key_set: RwLock<Option<CachedKeySet>>,
}

impl FirebaseVerifier {
    /// Create a verifier for tokens issued for the Firebase project `project_id`.
    pub fn new(project_id: &str) -> Self {
        Self::with_jwks_url(project_id, FIREBASE_JWKS_URL)
    }

    /// Create a verifier that fetches signing keys from `jwks_url`.
    pub fn with_jwks_url(project_id: &str, jwks_url: &str) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{project_id}")]);

        Self {
            client: reqwest::Client::new(),
            jwks_url: jwks_url.to_owned(),
            validation,
            key_set: RwLock::new(None),
        }
    }

    async fn decoding_key(&self, key_id: &str) -> Result<DecodingKey, VerifyError> {
        {
            let key_set = self.key_set.read().await;
            let fresh_key_set = key_set
                .as_ref()
                .filter(|cached| cached.fetched_at.elapsed() < KEY_SET_MAX_AGE);

            if let Some(cached) = fresh_key_set {
                if let Some(jwk) = cached.keys.find(key_id) {
                    return DecodingKey::from_jwk(jwk)
                        .map_err(|error| VerifyError::Rejected(error.to_string()));
                }

                if cached.fetched_at.elapsed() < MIN_REFETCH_INTERVAL {
                    return Err(unknown_key(key_id));
                }
            }
        }

        let keys = self.fetch_key_set().await?;
        let key = keys
            .find(key_id)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(|error| VerifyError::Rejected(error.to_string()))?;

        *self.key_set.write().await = Some(CachedKeySet {
            keys,
            fetched_at: Instant::now(),
        });

        key.ok_or_else(|| unknown_key(key_id))
    }

    async fn fetch_key_set(&self) -> Result<JwkSet, VerifyError> {
        tracing::debug!("fetching identity token signing keys from {}", self.jwks_url);

        self.client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| VerifyError::Unavailable(error.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|error| VerifyError::Unavailable(error.to_string()))
    }
}

fn unknown_key(key_id: &str) -> VerifyError {
    VerifyError::Rejected(format!("Unknown signing key \"{key_id}\""))
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let header =
            decode_header(token).map_err(|error| VerifyError::Rejected(error.to_string()))?;
        let key_id = header.kid.ok_or_else(|| {
            VerifyError::Rejected("Token header does not name a signing key".to_owned())
        })?;

        let key = self.decoding_key(&key_id).await?;
        let token_data = decode::<IdentityClaims>(token, &key, &self.validation)
            .map_err(|error| VerifyError::Rejected(error.to_string()))?;

        Identity::try_from(token_data.claims)
    }
}
