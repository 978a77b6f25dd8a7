//! A cached proxy for a third-party random quote service.

mod core;
mod endpoint;
mod proxy;

pub use core::{Quote, QuoteError, QuoteSource, ZEN_QUOTES_URL, ZenQuotesSource};
pub use endpoint::get_quote_endpoint;
pub use proxy::QuoteProxy;
