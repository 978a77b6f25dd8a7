//! User balances: how they are computed and the endpoints that report them.

mod balance_endpoint;
mod check_in_endpoint;
mod core;

pub use balance_endpoint::get_balance_endpoint;
pub use check_in_endpoint::check_in_endpoint;
pub use core::{
    Balance, BalancePolicy, BalanceReport, CheckInOutcome, create_user_aggregate_table,
    get_user_aggregate, increment_user_aggregate, insert_user_aggregate,
};

#[cfg(test)]
pub use core::UserAggregate;
