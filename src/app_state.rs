//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error, auth::IdentityVerifier, balance::BalancePolicy, db::initialize, quote::QuoteProxy,
    quote::QuoteSource,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// How balances are computed, fixed for the lifetime of the server.
    pub balance_policy: BalancePolicy,

    /// Verifies the bearer tokens on protected routes.
    pub identity_verifier: Arc<dyn IdentityVerifier>,

    /// Fetches quotes and caches the last one.
    pub quote_proxy: QuoteProxy,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        balance_policy: BalancePolicy,
        identity_verifier: Arc<dyn IdentityVerifier>,
        quote_source: Arc<dyn QuoteSource>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            balance_policy,
            identity_verifier,
            quote_proxy: QuoteProxy::new(quote_source),
        })
    }
}
