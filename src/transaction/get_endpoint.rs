use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error, Identity,
    transaction::{TransactionService, service::TransactionWithCategoryTotal},
};

/// A route handler for getting one of the verified user's transactions along
/// with the total of their transactions in the same category.
///
/// Responds with 404 if the transaction does not exist or belongs to someone else.
pub async fn get_transaction_endpoint(
    State(service): State<TransactionService>,
    Extension(identity): Extension<Identity>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionWithCategoryTotal>, Error> {
    service.get_one(&transaction_id, &identity).map(Json)
}
