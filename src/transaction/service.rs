//! The operations on a user's transactions that the route handlers call into.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use rusqlite::{Connection, Transaction as SqlTransaction};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error, Identity,
    balance::{
        Balance, BalancePolicy, BalanceReport, CheckInOutcome, get_user_aggregate,
        increment_user_aggregate, insert_user_aggregate,
    },
    transaction::{
        core::{
            Transaction, TransactionId, delete_transaction, get_transaction,
            get_transactions_by_owner, insert_transaction, sum_category, update_transaction,
        },
        validation::TransactionPayload,
    },
};

/// A transaction together with the total of its owner's transactions in the
/// same category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionWithCategoryTotal {
    /// The requested transaction.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The sum of the amounts of all the owner's transactions that share the
    /// transaction's category, including the transaction itself.
    pub category_total: f64,
}

/// Creates, reads, edits and deletes transactions on behalf of a verified user.
///
/// Every operation that takes an [Identity] only ever sees transactions owned
/// by that identity's email address. How balances are computed depends on the
/// [BalancePolicy] the service was created with.
#[derive(Debug, Clone)]
pub struct TransactionService {
    db_connection: Arc<Mutex<Connection>>,
    balance_policy: BalancePolicy,
}

impl FromRef<AppState> for TransactionService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.db_connection.clone(), state.balance_policy)
    }
}

impl TransactionService {
    /// Create a service backed by `db_connection`.
    pub fn new(db_connection: Arc<Mutex<Connection>>, balance_policy: BalancePolicy) -> Self {
        Self {
            db_connection,
            balance_policy,
        }
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }

    /// Validate `payload` and record it as a new transaction owned by `identity`.
    ///
    /// With [BalancePolicy::RunningTotal] the owner's running totals are
    /// incremented in the same database transaction.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if the payload is invalid, or an
    /// [Error::SqlError] if the transaction could not be stored.
    pub fn create(
        &self,
        payload: &TransactionPayload,
        identity: &Identity,
    ) -> Result<TransactionId, Error> {
        let new_transaction = payload.validate()?;
        let name = owner_name(payload, identity);
        let connection = self.connection()?;

        let transaction = SqlTransaction::new_unchecked(
            &connection,
            rusqlite::TransactionBehavior::Immediate,
        )?;

        let created = insert_transaction(
            &new_transaction,
            &identity.email,
            &name,
            OffsetDateTime::now_utc(),
            &transaction,
        )?;

        if self.balance_policy == BalancePolicy::RunningTotal {
            increment_user_aggregate(
                &identity.email,
                created.transaction_type,
                created.amount,
                &transaction,
            )?;
        }

        transaction.commit()?;

        tracing::debug!("created transaction {} for {}", created.id, identity.email);

        Ok(created.id)
    }

    /// Validate `payload` and replace the editable fields of the transaction
    /// `id` owned by `identity`.
    ///
    /// Returns the number of transactions changed, which is zero when `id`
    /// does not refer to one of the owner's transactions. Running totals are
    /// not adjusted.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if the payload is invalid, or an
    /// [Error::SqlError] if the transaction could not be stored.
    pub fn update(
        &self,
        id: &str,
        payload: &TransactionPayload,
        identity: &Identity,
    ) -> Result<usize, Error> {
        let edited = payload.validate()?;
        let name = owner_name(payload, identity);

        let Some(id) = parse_transaction_id(id) else {
            return Ok(0);
        };

        let rows_affected =
            update_transaction(id, &edited, &identity.email, &name, &*self.connection()?)?;

        if rows_affected == 0 {
            tracing::warn!(
                "update of transaction {id} by {} matched no transactions",
                identity.email
            );
        }

        Ok(rows_affected)
    }

    /// Get the balance for `identity`.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    pub fn balance(&self, identity: &Identity) -> Result<BalanceReport, Error> {
        let connection = self.connection()?;

        match self.balance_policy {
            BalancePolicy::FullScan => {
                let transactions = get_transactions_by_owner(&identity.email, &connection)?;

                Ok(BalanceReport::Computed(Balance::from_transactions(
                    &transactions,
                )))
            }
            BalancePolicy::RunningTotal => Ok(BalanceReport::Stored(get_user_aggregate(
                &identity.email,
                &connection,
            )?)),
        }
    }

    /// Get all of the transactions owned by `identity`, newest first.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    pub fn list_mine(&self, identity: &Identity) -> Result<Vec<Transaction>, Error> {
        get_transactions_by_owner(&identity.email, &*self.connection()?)
    }

    /// Get the transaction `id` owned by `identity` along with its category total.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if `id` does not refer to one of the
    /// owner's transactions, or an [Error::SqlError] if there is an SQL error.
    pub fn get_one(
        &self,
        id: &str,
        identity: &Identity,
    ) -> Result<TransactionWithCategoryTotal, Error> {
        let id = parse_transaction_id(id).ok_or(Error::NotFound)?;
        let connection = self.connection()?;

        let transaction = get_transaction(id, &identity.email, &connection)?;
        let category_total = sum_category(&identity.email, &transaction.category, &connection)?;

        Ok(TransactionWithCategoryTotal {
            transaction,
            category_total,
        })
    }

    /// Delete the transaction `id` owned by `identity`.
    ///
    /// Running totals are not adjusted.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if `id` does not refer to one of the
    /// owner's transactions, or an [Error::SqlError] if there is an SQL error.
    pub fn delete(&self, id: &str, identity: &Identity) -> Result<(), Error> {
        let id = parse_transaction_id(id).ok_or(Error::NotFound)?;

        match delete_transaction(id, &identity.email, &*self.connection()?)? {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    }

    /// Create zeroed running totals for `email` unless they already exist.
    ///
    /// # Errors
    /// Returns an [Error::MissingEmail] if `email` is empty, or an
    /// [Error::SqlError] if there is an SQL error.
    pub fn check_in(&self, email: &str) -> Result<CheckInOutcome, Error> {
        if email.is_empty() {
            return Err(Error::MissingEmail);
        }

        insert_user_aggregate(email, &*self.connection()?)
    }
}

/// The name stored with a transaction: the verified display name, falling back
/// to the name given in the payload.
fn owner_name(payload: &TransactionPayload, identity: &Identity) -> String {
    identity.name.clone().unwrap_or_else(|| payload.name())
}

/// Transaction IDs are opaque to clients, so an ID that does not parse simply
/// matches no transaction.
fn parse_transaction_id(id: &str) -> Option<TransactionId> {
    id.parse().ok()
}
