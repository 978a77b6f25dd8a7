use axum::{Extension, Json, extract::State};

use crate::{Error, Identity, balance::BalanceReport, transaction::TransactionService};

/// A route handler for getting the verified user's balance.
pub async fn get_balance_endpoint(
    State(service): State<TransactionService>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<BalanceReport>, Error> {
    service.balance(&identity).map(Json)
}
