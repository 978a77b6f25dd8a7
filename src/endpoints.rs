//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/transaction/{transaction_id}', use [format_endpoint].

/// The root route which answers with a greeting.
pub const ROOT: &str = "/";
/// The route for fetching a random quote.
pub const QUOTE: &str = "/quote";
/// The route for creating a user's running totals.
pub const CHECK_IN: &str = "/check";
/// The route to create a transaction.
pub const ADD_TRANSACTION: &str = "/add-transaction";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/transaction/{transaction_id}";
/// The route for the authenticated user's balance.
pub const BALANCE: &str = "/balance";
/// The route for listing the authenticated user's transactions.
pub const MY_TRANSACTIONS: &str = "/my-transactions";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/transaction/{transaction_id}', '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::QUOTE);
        assert_endpoint_is_valid_uri(endpoints::CHECK_IN);
        assert_endpoint_is_valid_uri(endpoints::ADD_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::BALANCE);
        assert_endpoint_is_valid_uri(endpoints::MY_TRANSACTIONS);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint(endpoints::TRANSACTION, 1);

        assert_eq!(formatted_path, "/transaction/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn accepts_non_numeric_ids() {
        let formatted_path = format_endpoint(endpoints::TRANSACTION, "not-an-id");

        assert_eq!(formatted_path, "/transaction/not-an-id");
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
    }
}
