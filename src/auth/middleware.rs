//! Authentication middleware that verifies bearer tokens and attaches the
//! verified identity to the request.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    AppState,
    auth::identity::{IdentityVerifier, VerifyError},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct IdentityState {
    /// Verifies the bearer tokens sent by clients.
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            verifier: state.identity_verifier.clone(),
        }
    }
}

/// The reasons a request can fail authentication.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// The Authorization header is missing or is not a bearer token.
    #[error("Missing or invalid authorization header")]
    MissingCredentials,
    /// The verifier rejected the token, the message says why.
    #[error("{0}")]
    InvalidToken(String),
    /// The token could not be verified at all.
    #[error("Unauthorized or invalid token")]
    VerificationFailed,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::VerificationFailed => StatusCode::FORBIDDEN,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Middleware function that checks for a valid bearer token.
/// The verified [Identity](crate::Identity) is placed into the request and the
/// request executed normally if the token is valid, otherwise an [AuthError]
/// response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(identity): Extension<Identity>` to receive the identity.
pub async fn identity_guard(
    State(state): State<IdentityState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = get_bearer_token(request.headers()) else {
        return AuthError::MissingCredentials.into_response();
    };

    let identity = match state.verifier.verify(&token).await {
        Ok(identity) => identity,
        Err(VerifyError::Rejected(message)) => {
            tracing::debug!("Rejected bearer token: {message}");
            return AuthError::InvalidToken(message).into_response();
        }
        Err(error) => {
            tracing::error!("Error verifying bearer token: {error}");
            return AuthError::VerificationFailed.into_response();
        }
    };

    request.extensions_mut().insert(identity);

    next.run(request).await
}

/// Get the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is case-sensitive and the token ends at the first space.
fn get_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let credentials = value.strip_prefix("Bearer ")?;

    credentials.split(' ').next().map(str::to_owned)
}

#[cfg(test)]
mod identity_guard_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{Extension, Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;
    use serde_json::json;

    use super::{IdentityState, identity_guard};
    use crate::{
        Identity,
        auth::{IdentityVerifier, SharedSecretVerifier, VerifyError, encode_test_token},
    };

    const SECRET: &str = "nafstenoas";
    const TEST_PROTECTED_ROUTE: &str = "/protected";

    struct UnavailableVerifier;

    #[async_trait]
    impl IdentityVerifier for UnavailableVerifier {
        async fn verify(&self, _token: &str) -> Result<Identity, VerifyError> {
            Err(VerifyError::Unavailable("key server is down".to_owned()))
        }
    }

    async fn test_handler(Extension(identity): Extension<Identity>) -> String {
        identity.email
    }

    fn get_test_server(verifier: Arc<dyn IdentityVerifier>) -> TestServer {
        let state = IdentityState { verifier };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), identity_guard))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn shared_secret_server() -> TestServer {
        get_test_server(Arc::new(SharedSecretVerifier::new(SECRET)))
    }

    #[tokio::test]
    async fn valid_token_passes_identity_to_handler() {
        let server = shared_secret_server();
        let token = encode_test_token(SECRET, "alice@example.com", None, 3600);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("Authorization", format!("Bearer {token}"))
            .await;

        response.assert_status_ok();
        response.assert_text("alice@example.com");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let server = shared_secret_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "Missing or invalid authorization header" }));
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let server = shared_secret_server();
        let token = encode_test_token(SECRET, "alice@example.com", None, 3600);

        for header in [format!("Basic {token}"), format!("bearer {token}"), token] {
            let response = server
                .get(TEST_PROTECTED_ROUTE)
                .add_header("Authorization", header)
                .await;

            response.assert_status(StatusCode::UNAUTHORIZED);
            response.assert_json(&json!({ "error": "Missing or invalid authorization header" }));
        }
    }

    #[tokio::test]
    async fn rejected_token_is_unauthorized_with_reason() {
        let server = shared_secret_server();
        let token = encode_test_token("hunter2", "alice@example.com", None, 3600);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("Authorization", format!("Bearer {token}"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body = response.json::<serde_json::Value>();
        let message = body["error"].as_str().expect("error should be a string");
        assert_ne!(message, "Missing or invalid authorization header");
        assert!(!message.is_empty());
    }

    #[tokio::test]
    async fn verifier_failure_is_forbidden() {
        let server = get_test_server(Arc::new(UnavailableVerifier));

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("Authorization", "Bearer anything")
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        response.assert_json(&json!({ "error": "Unauthorized or invalid token" }));
    }
}
