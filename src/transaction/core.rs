//! Defines the core data models and database queries for transactions.

use std::{fmt, str::FromStr};

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

// ============================================================================
// MODELS
// ============================================================================

/// Alias for the integer type used for mapping to transaction IDs.
pub type TransactionId = i64;

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money that was earned.
    Income,
    /// Money that was spent.
    Expense,
}

impl TransactionType {
    /// The name used for this type in JSON payloads and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(()),
        }
    }
}

/// An expense or income recorded by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction, assigned by the database.
    #[serde(rename = "_id")]
    pub id: TransactionId,
    /// Whether this transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A free-form label used to group transactions, e.g. "Groceries".
    pub category: String,
    /// The amount of money spent or earned, always at least 1.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened, as entered by the user.
    pub date: String,
    /// When the transaction was recorded by the server.
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The email address of the user that owns this transaction.
    pub email: String,
    /// The display name of the owner at the time of the last write.
    pub name: String,
}

/// The validated, user-editable fields of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether this transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// A free-form label used to group transactions.
    pub category: String,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, type, category, amount, description, date, created_at, email, name";

/// Insert a new transaction owned by `email`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn insert_transaction(
    transaction: &NewTransaction,
    email: &str,
    name: &str,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (type, category, amount, description, date, created_at, email, name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                transaction.transaction_type.as_str(),
                transaction.category,
                transaction.amount,
                transaction.description,
                transaction.date,
                to_unix_micros(created_at),
                email,
                name,
            ],
            map_transaction_row,
        )
        .map_err(Error::from)
}

type RowsAffected = usize;

/// Replace the editable fields of the transaction `id` owned by `email`.
///
/// The owner email and creation time are never changed.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn update_transaction(
    id: TransactionId,
    transaction: &NewTransaction,
    email: &str,
    name: &str,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE \"transaction\"
            SET \
                type = ?1, \
                category = ?2, \
                amount = ?3, \
                description = ?4, \
                date = ?5, \
                name = ?6 \
            WHERE id = ?7 AND email = ?8;",
            params![
                transaction.transaction_type.as_str(),
                transaction.category,
                transaction.amount,
                transaction.description,
                transaction.date,
                name,
                id,
                email,
            ],
        )
        .map_err(Error::from)
}

/// Retrieve the transaction `id` if it is owned by `email`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `email`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    email: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND email = ?2"
        ))?
        .query_row(params![id, email], map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => error.into(),
        })
}

/// Get all transactions owned by `email`, most recently created first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_by_owner(
    email: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE email = ?1
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([email], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Sum the amounts of all transactions owned by `email` in `category`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn sum_category(email: &str, category: &str, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\"
             WHERE email = ?1 AND category = ?2",
            [email, category],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Delete the transaction `id` if it is owned by `email`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    id: TransactionId,
    email: &str,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND email = ?2",
            params![id, email],
        )
        .map_err(Error::from)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 1),
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                email TEXT NOT NULL,
                name TEXT NOT NULL
                )",
        (),
    )?;

    // Every query is scoped to one owner.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_email_created_at
         ON \"transaction\"(email, created_at);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_email_category
         ON \"transaction\"(email, category);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let type_text: String = row.get(1)?;
    let transaction_type = type_text.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("invalid transaction type {type_text:?}").into(),
        )
    })?;
    let created_at = from_unix_micros(row.get(6)?).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Integer, error.into())
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        transaction_type,
        category: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        date: row.get(5)?,
        created_at,
        email: row.get(7)?,
        name: row.get(8)?,
    })
}

// Creation times are stored as integer microseconds so that they sort correctly.
fn to_unix_micros(date_time: OffsetDateTime) -> i64 {
    (date_time.unix_timestamp_nanos() / 1_000) as i64
}

fn from_unix_micros(micros: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
}

// ============================================================================
// TESTS
// ============================================================================
