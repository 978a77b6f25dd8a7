#![allow(missing_docs)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, BalancePolicy, SharedSecretVerifier, build_router,
    auth::encode_test_token,
    db::initialize,
    endpoints,
    quote::{Quote, QuoteError, QuoteSource},
    transaction::{TransactionId, TransactionPayload},
};

pub(crate) const TEST_SECRET: &str = "nafstenoas";
pub(crate) const ALICE: &str = "alice@example.com";
pub(crate) const BOB: &str = "bob@example.com";

/// A quote source that replays a fixed list of results, then fails.
pub(crate) struct ScriptedQuoteSource {
    results: Mutex<VecDeque<Result<Quote, QuoteError>>>,
}

impl ScriptedQuoteSource {
    pub(crate) fn new(results: impl IntoIterator<Item = Result<Quote, QuoteError>>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().collect()),
        }
    }
}

#[async_trait]
impl QuoteSource for ScriptedQuoteSource {
    async fn fetch_random(&self) -> Result<Quote, QuoteError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(QuoteError::Empty))
    }
}

/// The Authorization header value for a valid token for `email`.
pub(crate) fn bearer(email: &str) -> String {
    format!("Bearer {}", encode_test_token(TEST_SECRET, email, None, 3600))
}

pub(crate) fn test_connection() -> Arc<Mutex<Connection>> {
    let connection = Connection::open_in_memory().unwrap();
    initialize(&connection).unwrap();

    Arc::new(Mutex::new(connection))
}

pub(crate) fn transaction_payload(
    transaction_type: &str,
    category: &str,
    amount: i64,
) -> TransactionPayload {
    serde_json::from_value(json!({
        "type": transaction_type,
        "category": category,
        "amount": amount,
        "date": "2025-10-05",
    }))
    .unwrap()
}

pub(crate) fn get_test_server(balance_policy: BalancePolicy) -> TestServer {
    get_test_server_with_quotes(balance_policy, std::iter::empty())
}

pub(crate) fn get_test_server_with_quotes(
    balance_policy: BalancePolicy,
    quotes: impl IntoIterator<Item = Result<Quote, QuoteError>>,
) -> TestServer {
    let state = AppState::new(
        Connection::open_in_memory().unwrap(),
        balance_policy,
        Arc::new(SharedSecretVerifier::new(TEST_SECRET)),
        Arc::new(ScriptedQuoteSource::new(quotes)),
    )
    .expect("Could not create app state.");

    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// Create a transaction through the API and return its ID.
pub(crate) async fn create_test_transaction(
    server: &TestServer,
    email: &str,
    transaction_type: &str,
    category: &str,
    amount: i64,
) -> TransactionId {
    let response = server
        .post(endpoints::ADD_TRANSACTION)
        .add_header("Authorization", bearer(email))
        .json(&json!({
            "type": transaction_type,
            "category": category,
            "amount": amount,
            "date": "2025-10-05",
        }))
        .await;

    response.assert_status_ok();
    response.json::<Value>()["insertedId"]
        .as_i64()
        .expect("insertedId should be an integer")
}

pub(crate) async fn check_in(server: &TestServer, email: &str) {
    server
        .post(endpoints::CHECK_IN)
        .json(&json!({ "email": email }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
}
