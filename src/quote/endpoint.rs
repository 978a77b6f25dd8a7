use axum::{Json, extract::State};

use crate::{
    Error,
    quote::proxy::{QuoteProxy, QuoteResponse},
};

/// A route handler for getting a random quote.
pub async fn get_quote_endpoint(
    State(proxy): State<QuoteProxy>,
) -> Result<Json<QuoteResponse>, Error> {
    proxy.get_quote().await.map(Json)
}
