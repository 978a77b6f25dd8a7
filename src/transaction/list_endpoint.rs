use axum::{Extension, Json, extract::State};

use crate::{
    Error, Identity,
    transaction::{Transaction, TransactionService},
};

/// A route handler for listing all of the verified user's transactions, newest first.
pub async fn list_transactions_endpoint(
    State(service): State<TransactionService>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Transaction>>, Error> {
    service.list_mine(&identity).map(Json)
}
