//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the database functions for storing it
//! - Validation of the JSON payload clients send
//! - The `TransactionService` that route handlers call into
//! - The route handlers themselves

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
mod list_endpoint;
mod service;
mod validation;

pub use core::{Transaction, TransactionId, TransactionType, create_transaction_table};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use get_endpoint::get_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use service::TransactionService;
pub use validation::{TransactionPayload, ValidationError};
