//! Serves quotes from the upstream source, falling back to the last good quote.

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::FromRef;
use serde::Serialize;

use crate::{
    AppState, Error,
    quote::core::{Quote, QuoteSource},
};

/// The response body for a quote request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteResponse {
    /// The quote and its author.
    #[serde(flatten)]
    pub quote: Quote,
    /// Whether the quote was served from the cache because the upstream failed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

/// Fetches quotes and keeps the most recent successful one.
///
/// The cache holds a single quote and never expires.
#[derive(Clone)]
pub struct QuoteProxy {
    source: Arc<dyn QuoteSource>,
    cache: Arc<Mutex<Option<Quote>>>,
}

impl FromRef<AppState> for QuoteProxy {
    fn from_ref(state: &AppState) -> Self {
        state.quote_proxy.clone()
    }
}

impl QuoteProxy {
    /// Create a proxy for `source` with an empty cache.
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self {
            source,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Fetch a fresh quote, or the cached quote if the upstream fails.
    ///
    /// # Errors
    /// Returns [Error::QuoteUnavailable] if the upstream fails and nothing is
    /// cached.
    pub async fn get_quote(&self) -> Result<QuoteResponse, Error> {
        match self.source.fetch_random().await {
            Ok(quote) => {
                *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = Some(quote.clone());

                Ok(QuoteResponse {
                    quote,
                    cached: false,
                })
            }
            Err(error) => {
                tracing::warn!("Serving cached quote: {error}");

                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
                    .map(|quote| QuoteResponse {
                        quote,
                        cached: true,
                    })
                    .ok_or(Error::QuoteUnavailable)
            }
        }
    }
}
