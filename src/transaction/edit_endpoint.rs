use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    Error, Identity,
    transaction::{
        TransactionService, create_endpoint::WriteTransactionResponse,
        validation::TransactionPayload,
    },
};

/// A route handler for replacing the editable fields of one of the verified
/// user's transactions.
///
/// Responds with success even if the ID does not match any of the user's
/// transactions.
pub async fn edit_transaction_endpoint(
    State(service): State<TransactionService>,
    Extension(identity): Extension<Identity>,
    Path(transaction_id): Path<String>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Json<WriteTransactionResponse>, Error> {
    let Json(payload) = payload?;

    service
        .update(&transaction_id, &payload, &identity)
        .inspect_err(|error| {
            if !matches!(error, Error::Validation(_)) {
                tracing::error!("Could not update transaction {transaction_id}: {error}");
            }
        })?;

    Ok(Json(WriteTransactionResponse {
        success: true,
        inserted_id: None,
        message: "Transaction updated successfully!",
    }))
}
