use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Error, balance::CheckInOutcome, transaction::TransactionService};

/// The body of a check-in request.
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    /// The email address of the user to create running totals for.
    #[serde(default)]
    pub email: Option<String>,
}

/// A route handler that creates zeroed running totals for a user the first
/// time they are seen.
///
/// Responds with 201 when the totals are created and 200 when they already exist.
pub async fn check_in_endpoint(
    State(service): State<TransactionService>,
    request: Result<Json<CheckInRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let Json(request) = request?;
    let email = request.email.unwrap_or_default();

    let response = match service.check_in(&email)? {
        CheckInOutcome::Created => {
            tracing::info!("created running totals for {email}");
            (
                StatusCode::CREATED,
                Json(json!({ "message": "User created successfully" })),
            )
        }
        CheckInOutcome::AlreadyExists => (
            StatusCode::OK,
            Json(json!({ "message": "User already exists" })),
        ),
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{BalancePolicy, endpoints, test_utils::get_test_server};

    #[tokio::test]
    async fn check_in_creates_then_reports_existing() {
        let server = get_test_server(BalancePolicy::RunningTotal);

        let response = server
            .post(endpoints::CHECK_IN)
            .json(&json!({ "email": "alice@example.com" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.assert_json(&json!({ "message": "User created successfully" }));

        let response = server
            .post(endpoints::CHECK_IN)
            .json(&json!({ "email": "alice@example.com" }))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({ "message": "User already exists" }));
    }

    #[tokio::test]
    async fn check_in_requires_email() {
        let server = get_test_server(BalancePolicy::RunningTotal);

        let response = server.post(endpoints::CHECK_IN).json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Email is required" }));
    }

    #[tokio::test]
    async fn check_in_is_not_routed_with_full_scan() {
        let server = get_test_server(BalancePolicy::FullScan);

        let response = server
            .post(endpoints::CHECK_IN)
            .json(&json!({ "email": "alice@example.com" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
