//! FinTrack is a backend for tracking personal income and expenses.
//!
//! This library provides a JSON REST API for recording transactions per
//! authenticated user and reporting their balance, plus a cached proxy for a
//! third-party quote service.

#![warn(missing_docs)]

use std::{net::SocketAddr, path::Path, time::Duration};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod balance;
mod db;
mod endpoints;
mod logging;
mod quote;
mod routing;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{FirebaseVerifier, Identity, IdentityVerifier, SharedSecretVerifier, VerifyError};
pub use balance::BalancePolicy;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_BYTES, logging_middleware};
pub use quote::{Quote, QuoteError, QuoteSource, ZEN_QUOTES_URL, ZenQuotesSource};
pub use routing::build_router;
pub use transaction::ValidationError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// Load the TLS certificate `cert.pem` and private key `key.pem` from `cert_dir`.
///
/// # Errors
/// Returns an error if either file cannot be read or parsed.
pub async fn load_tls_config(cert_dir: impl AsRef<Path>) -> std::io::Result<RustlsConfig> {
    let cert_dir = cert_dir.as_ref();

    RustlsConfig::from_pem_file(cert_dir.join("cert.pem"), cert_dir.join("key.pem")).await
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The transaction payload failed validation.
    ///
    /// The client should fix the field named in the error and try again.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request body could not be parsed as JSON.
    #[error("{0}")]
    InvalidJson(String),

    /// A check-in request did not include an email address.
    #[error("Email is required")]
    MissingEmail,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Resources owned by another user are reported as not found so that
    /// clients cannot learn whether another user's resource exists.
    #[error("Transaction not found")]
    NotFound,

    /// The quote service could not be reached and there is no cached quote to
    /// fall back on.
    #[error("Failed to fetch quote and no cache available")]
    QuoteUnavailable,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(#[from] rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) | Error::InvalidJson(_) | Error::MissingEmail => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::QuoteUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                return internal_server_error();
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidJson(rejection.body_text())
    }
}

/// The generic response for errors that the client cannot act on.
pub(crate) fn internal_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}
