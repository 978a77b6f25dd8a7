//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{MethodRouter, get, patch, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    auth::identity_guard,
    balance::{BalancePolicy, check_in_endpoint, get_balance_endpoint},
    endpoints,
    quote::get_quote_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// The routes that exist depend on `state.balance_policy`: the check-in route is only
/// served with [BalancePolicy::RunningTotal], and single transactions can only be
/// read or deleted with [BalancePolicy::FullScan].
pub fn build_router(state: AppState) -> Router {
    let mut unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_root))
        .route(endpoints::QUOTE, get(get_quote_endpoint));

    if state.balance_policy == BalancePolicy::RunningTotal {
        unprotected_routes = unprotected_routes.route(endpoints::CHECK_IN, post(check_in_endpoint));
    }

    let protected_routes = Router::new()
        .route(
            endpoints::ADD_TRANSACTION,
            post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, transaction_routes(state.balance_policy))
        .route(endpoints::BALANCE, get(get_balance_endpoint))
        .route(endpoints::MY_TRANSACTIONS, get(list_transactions_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), identity_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn transaction_routes(balance_policy: BalancePolicy) -> MethodRouter<AppState> {
    match balance_policy {
        BalancePolicy::FullScan => get(get_transaction_endpoint)
            .patch(edit_transaction_endpoint)
            .delete(delete_transaction_endpoint),
        BalancePolicy::RunningTotal => patch(edit_transaction_endpoint),
    }
}

/// A liveness check.
async fn get_root() -> &'static str {
    "Hello World!"
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
