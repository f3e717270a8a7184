//! Movie-quote trivia shown on the room screen.
//!
//! The server doesn't ship quotes itself — it defines the
//! [`QuoteSource`] trait and loads whatever the deployment provides:
//! a bundled list, a file, an HTTP API. The cache polls the source once
//! at startup and degrades to empty on failure; quote trivia is
//! decoration, never worth failing the server over.

use rand::Rng;

use crate::ServerError;

/// Supplies the quote lines to cache at startup.
///
/// `Send + Sync + 'static` so the source can be shared with the server
/// task for the lifetime of the process.
pub trait QuoteSource: Send + Sync + 'static {
    /// Fetches all available quote lines.
    fn load(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, ServerError>> + Send;
}

/// A [`QuoteSource`] backed by a fixed list. Handy for demos and tests.
pub struct StaticQuotes(pub Vec<String>);

impl QuoteSource for StaticQuotes {
    async fn load(&self) -> Result<Vec<String>, ServerError> {
        Ok(self.0.clone())
    }
}

/// The in-memory quote pool, loaded once at startup.
#[derive(Debug, Default)]
pub struct QuoteCache {
    quotes: Vec<String>,
}

impl QuoteCache {
    /// Polls the source once. A failed load logs a warning and yields an
    /// empty cache.
    pub async fn load(source: &impl QuoteSource) -> Self {
        match source.load().await {
            Ok(quotes) => {
                tracing::info!(count = quotes.len(), "quote cache loaded");
                Self { quotes }
            }
            Err(e) => {
                tracing::warn!(%e, "quote source failed, serving without quotes");
                Self::default()
            }
        }
    }

    /// Picks a random cached quote.
    pub fn random(&self) -> Option<&str> {
        if self.quotes.is_empty() {
            return None;
        }
        let i = rand::rng().random_range(0..self.quotes.len());
        Some(&self.quotes[i])
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
