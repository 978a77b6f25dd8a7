use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{Error, Identity, transaction::TransactionService};

/// A route handler for deleting one of the verified user's transactions.
///
/// Responds with 404 if the transaction does not exist or belongs to someone else.
pub async fn delete_transaction_endpoint(
    State(service): State<TransactionService>,
    Extension(identity): Extension<Identity>,
    Path(transaction_id): Path<String>,
) -> Response {
    match service.delete(&transaction_id, &identity) {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Transaction deleted successfully.",
        }))
        .into_response(),
        Err(Error::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "message": "Transaction not found",
            })),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}
