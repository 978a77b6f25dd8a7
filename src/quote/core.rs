//! Defines the quote type and the upstream sources quotes are fetched from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The default upstream that serves a random quote.
pub const ZEN_QUOTES_URL: &str = "https://zenquotes.io/api/random";

/// A quote and the person it is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// The text of the quote.
    pub quote: String,
    /// Who said it.
    pub author: String,
}

/// The errors that may occur when fetching a quote.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    /// The upstream could not be reached or returned an error status.
    #[error("could not fetch quote: {0}")]
    Request(String),

    /// The upstream responded with a body that holds no quote.
    #[error("the quote service returned no quotes")]
    Empty,
}

/// Somewhere a random quote can be fetched from.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch one random quote.
    async fn fetch_random(&self) -> Result<Quote, QuoteError>;
}

/// Fetches quotes from the ZenQuotes API.
#[derive(Debug, Clone)]
pub struct ZenQuotesSource {
    client: reqwest::Client,
    url: String,
}

impl ZenQuotesSource {
    /// Create a source that fetches from `url`, see [ZEN_QUOTES_URL].
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for ZenQuotesSource {
    fn default() -> Self {
        Self::new(ZEN_QUOTES_URL)
    }
}

/// One entry of the ZenQuotes response array.
#[derive(Debug, Deserialize)]
struct ZenQuote {
    q: String,
    a: String,
}

#[async_trait]
impl QuoteSource for ZenQuotesSource {
    async fn fetch_random(&self) -> Result<Quote, QuoteError> {
        let quotes: Vec<ZenQuote> = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| QuoteError::Request(error.to_string()))?
            .json()
            .await
            .map_err(|error| QuoteError::Request(error.to_string()))?;

        quotes
            .into_iter()
            .next()
            .map(|zen_quote| Quote {
                quote: zen_quote.q,
                author: zen_quote.a,
            })
            .ok_or(QuoteError::Empty)
    }
}
