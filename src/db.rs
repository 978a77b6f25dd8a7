//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{Error, balance::create_user_aggregate_table, transaction::create_transaction_table};

/// Create the tables for the domain models if they do not already exist.
///
/// This must be called before the connection is handed to the request
/// handlers, so the server never accepts traffic against a database that is
/// not ready.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_transaction_table(&transaction)?;
    create_user_aggregate_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
