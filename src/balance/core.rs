//! Defines how balances are computed and the per-user running totals table.

use clap::ValueEnum;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    transaction::{Transaction, TransactionType},
};

/// How a user's balance is computed.
///
/// This is chosen once when the server starts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BalancePolicy {
    /// Sum every transaction the user owns each time the balance is requested.
    #[default]
    FullScan,
    /// Keep running totals per user that are incremented whenever a
    /// transaction is created.
    ///
    /// Updating or deleting a transaction does not adjust the running totals.
    ///
    /// Running totals are normally created by a check-in, but creating a
    /// transaction for a user who never checked in also creates them. Such a
    /// user's balance is then reported instead of `null`.
    RunningTotal,
}

/// A user's income and expense totals and the difference between them.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Income minus expenses.
    pub balance: f64,
    /// The sum of all income.
    pub income: f64,
    /// The sum of all expenses.
    pub expense: f64,
}

impl Balance {
    /// Sum `transactions` by type.
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let (income, expense) =
            transactions
                .into_iter()
                .fold((0.0, 0.0), |(income, expense), transaction| {
                    match transaction.transaction_type {
                        TransactionType::Income => (income + transaction.amount, expense),
                        TransactionType::Expense => (income, expense + transaction.amount),
                    }
                });

        Self {
            balance: income - expense,
            income,
            expense,
        }
    }
}

/// The stored running totals for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAggregate {
    /// The email address of the user these totals belong to.
    pub email: String,
    /// Income minus expenses.
    pub balance: f64,
    /// The sum of all income recorded since the aggregate was created.
    pub income: f64,
    /// The sum of all expenses recorded since the aggregate was created.
    pub expense: f64,
}

/// The balance reported to a client, shaped by the [BalancePolicy] in use.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BalanceReport {
    /// Totals computed from the user's transactions.
    Computed(Balance),
    /// The user's stored running totals, or `None` if they have none yet.
    Stored(Option<UserAggregate>),
}

/// Whether a check-in created the user's running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// Zeroed running totals were created for the user.
    Created,
    /// The user already had running totals, nothing was changed.
    AlreadyExists,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create zeroed running totals for `email` if they do not exist yet.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn insert_user_aggregate(email: &str, connection: &Connection) -> Result<CheckInOutcome, Error> {
    let rows_affected = connection.execute(
        "INSERT INTO user_aggregate (email, balance, income, expense)
         VALUES (?1, 0.0, 0.0, 0.0)
         ON CONFLICT(email) DO NOTHING",
        [email],
    )?;

    Ok(match rows_affected {
        0 => CheckInOutcome::AlreadyExists,
        _ => CheckInOutcome::Created,
    })
}

/// Add `amount` to the running totals for `email`.
///
/// Income increases `income` and `balance`, expenses increase `expense` and
/// decrease `balance`. The totals are created if they do not exist yet. The
/// read-modify-write happens inside a single statement so concurrent
/// increments are not lost.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn increment_user_aggregate(
    email: &str,
    transaction_type: TransactionType,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let (balance, income, expense) = match transaction_type {
        TransactionType::Income => (amount, amount, 0.0),
        TransactionType::Expense => (-amount, 0.0, amount),
    };

    connection.execute(
        "INSERT INTO user_aggregate (email, balance, income, expense)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(email) DO UPDATE SET
            balance = balance + excluded.balance,
            income = income + excluded.income,
            expense = expense + excluded.expense",
        params![email, balance, income, expense],
    )?;

    Ok(())
}

/// Retrieve the running totals for `email`, if there are any.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_user_aggregate(
    email: &str,
    connection: &Connection,
) -> Result<Option<UserAggregate>, Error> {
    connection
        .prepare("SELECT email, balance, income, expense FROM user_aggregate WHERE email = ?1")?
        .query_row([email], map_user_aggregate_row)
        .optional()
        .map_err(Error::from)
}

/// Create the running totals table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_aggregate_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_aggregate (
                email TEXT PRIMARY KEY NOT NULL,
                balance REAL NOT NULL,
                income REAL NOT NULL,
                expense REAL NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_user_aggregate_row(row: &Row) -> Result<UserAggregate, rusqlite::Error> {
    Ok(UserAggregate {
        email: row.get(0)?,
        balance: row.get(1)?,
        income: row.get(2)?,
        expense: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::json;
    use time::OffsetDateTime;

    use crate::{
        balance::core::{
            Balance, BalanceReport, CheckInOutcome, UserAggregate, get_user_aggregate,
            increment_user_aggregate, insert_user_aggregate,
        },
        db::initialize,
        transaction::{Transaction, TransactionType},
    };

    const OWNER: &str = "alice@example.com";

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn transaction(transaction_type: TransactionType, amount: f64) -> Transaction {
        Transaction {
            id: 1,
            transaction_type,
            category: "Misc".to_owned(),
            amount,
            description: String::new(),
            date: "2025-10-05".to_owned(),
            created_at: OffsetDateTime::now_utc(),
            email: OWNER.to_owned(),
            name: String::new(),
        }
    }

    #[test]
    fn balance_from_transactions_splits_by_type() {
        let transactions = [
            transaction(TransactionType::Income, 100.0),
            transaction(TransactionType::Expense, 30.0),
            transaction(TransactionType::Expense, 5.0),
        ];

        let balance = Balance::from_transactions(&transactions);

        assert_eq!(
            balance,
            Balance {
                balance: 65.0,
                income: 100.0,
                expense: 35.0,
            }
        );
    }

    #[test]
    fn balance_of_no_transactions_is_zero() {
        assert_eq!(Balance::from_transactions(&Vec::<Transaction>::new()), Balance::default());
    }

    #[test]
    fn check_in_creates_once() {
        let conn = get_test_connection();

        assert_eq!(
            insert_user_aggregate(OWNER, &conn),
            Ok(CheckInOutcome::Created)
        );
        assert_eq!(
            insert_user_aggregate(OWNER, &conn),
            Ok(CheckInOutcome::AlreadyExists)
        );
        assert_eq!(
            get_user_aggregate(OWNER, &conn),
            Ok(Some(UserAggregate {
                email: OWNER.to_owned(),
                balance: 0.0,
                income: 0.0,
                expense: 0.0,
            }))
        );
    }

    #[test]
    fn increments_keep_balance_equal_to_income_minus_expense() {
        let conn = get_test_connection();
        insert_user_aggregate(OWNER, &conn).unwrap();

        increment_user_aggregate(OWNER, TransactionType::Income, 100.0, &conn).unwrap();
        increment_user_aggregate(OWNER, TransactionType::Expense, 30.0, &conn).unwrap();

        let aggregate = get_user_aggregate(OWNER, &conn).unwrap().unwrap();
        assert_eq!(aggregate.income, 100.0);
        assert_eq!(aggregate.expense, 30.0);
        assert_eq!(aggregate.balance, 70.0);
    }

    #[test]
    fn increment_creates_missing_aggregate() {
        let conn = get_test_connection();

        increment_user_aggregate(OWNER, TransactionType::Expense, 12.0, &conn).unwrap();

        let aggregate = get_user_aggregate(OWNER, &conn).unwrap().unwrap();
        assert_eq!(aggregate.balance, -12.0);
        assert_eq!(aggregate.expense, 12.0);
        assert_eq!(
            insert_user_aggregate(OWNER, &conn),
            Ok(CheckInOutcome::AlreadyExists)
        );
    }

    #[test]
    fn missing_aggregate_is_none() {
        let conn = get_test_connection();

        assert_eq!(get_user_aggregate(OWNER, &conn), Ok(None));
    }

    #[test]
    fn reports_serialize_without_variant_tags() {
        let computed = BalanceReport::Computed(Balance {
            balance: 70.0,
            income: 100.0,
            expense: 30.0,
        });
        assert_eq!(
            serde_json::to_value(computed).unwrap(),
            json!({ "balance": 70.0, "income": 100.0, "expense": 30.0 })
        );

        assert_eq!(
            serde_json::to_value(BalanceReport::Stored(None)).unwrap(),
            json!(null)
        );
    }
}
