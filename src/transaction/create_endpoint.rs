//! Defines the endpoint for creating a new transaction.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;

use crate::{
    Error, Identity,
    transaction::{TransactionId, TransactionService, validation::TransactionPayload},
};

/// The response body for a successful create or edit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteTransactionResponse {
    /// Always true, failures are reported with an error response instead.
    pub success: bool,
    /// The ID of the created transaction, not present for edits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<TransactionId>,
    /// A message for the user.
    pub message: &'static str,
}

/// A route handler for creating a new transaction owned by the verified user.
pub async fn create_transaction_endpoint(
    State(service): State<TransactionService>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Json<WriteTransactionResponse>, Error> {
    let Json(payload) = payload?;

    let id = service.create(&payload, &identity).inspect_err(|error| {
        if !matches!(error, Error::Validation(_)) {
            tracing::error!("could not create transaction: {error}");
        }
    })?;

    Ok(Json(WriteTransactionResponse {
        success: true,
        inserted_id: Some(id),
        message: "Transaction added successfully!",
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        BalancePolicy, endpoints,
        test_utils::{ALICE, bearer, get_test_server},
    };

    #[tokio::test]
    async fn can_create_transaction() {
        let server = get_test_server(BalancePolicy::FullScan);

        let response = server
            .post(endpoints::ADD_TRANSACTION)
            .add_header("Authorization", bearer(ALICE))
            .json(&json!({
                "type": "income",
                "category": "Salary",
                "amount": 100,
                "description": "October pay",
                "date": "2025-10-01",
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "success": true,
            "insertedId": 1,
            "message": "Transaction added successfully!",
        }));
    }

    #[tokio::test]
    async fn rejects_invalid_transactions_with_reason() {
        let server = get_test_server(BalancePolicy::FullScan);
        let cases = [
            (json!({ "type": "other" }), "Invalid type"),
            (json!({ "type": "expense" }), "Category is required"),
            (
                json!({ "type": "expense", "category": "Food", "amount": 0 }),
                "Amount must be at least 1",
            ),
            (
                json!({ "type": "expense", "category": "Food", "amount": -3 }),
                "Amount must be at least 1",
            ),
            (
                json!({ "type": "expense", "category": "Food", "amount": 3 }),
                "Date is required",
            ),
        ];

        for (body, want_error) in cases {
            let response = server
                .post(endpoints::ADD_TRANSACTION)
                .add_header("Authorization", bearer(ALICE))
                .json(&body)
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            response.assert_json(&json!({ "error": want_error }));
        }
    }

    #[tokio::test]
    async fn accepts_numeric_date() {
        let server = get_test_server(BalancePolicy::FullScan);

        let response = server
            .post(endpoints::ADD_TRANSACTION)
            .add_header("Authorization", bearer(ALICE))
            .json(&json!({
                "type": "expense",
                "category": "Food",
                "amount": 12,
                "date": 1700000000000_i64,
            }))
            .await;

        response.assert_status_ok();
        let transactions = server
            .get(endpoints::MY_TRANSACTIONS)
            .add_header("Authorization", bearer(ALICE))
            .await
            .json::<Value>();
        assert_eq!(transactions[0]["date"], "1700000000000");
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let server = get_test_server(BalancePolicy::FullScan);

        let response = server
            .post(endpoints::ADD_TRANSACTION)
            .add_header("Authorization", bearer(ALICE))
            .text("{not json")
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert!(body["error"].is_string(), "got {body}");
    }

    #[tokio::test]
    async fn requires_authorization() {
        let server = get_test_server(BalancePolicy::FullScan);

        let response = server
            .post(endpoints::ADD_TRANSACTION)
            .json(&json!({}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
