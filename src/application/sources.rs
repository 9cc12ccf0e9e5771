use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::prediction::interpret_payload;
use crate::infrastructure::engine_io::EngineIoClient;
use crate::infrastructure::fetch::PageFetcher;
use crate::infrastructure::markup::MarkupExtractor;
use crate::shared::errors::SourceError;
use crate::shared::types::PriceQuote;

/// One acquisition strategy. Failures are returned as values, never panics.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn quote(&self) -> Result<PriceQuote, SourceError>;
}

/// Streaming handshake followed by payload interpretation
pub struct StreamSource {
    client: EngineIoClient,
    preferred_timeframe: Option<String>,
}

impl StreamSource {
    pub fn new(client: EngineIoClient, preferred_timeframe: Option<String>) -> Self {
        Self {
            client,
            preferred_timeframe,
        }
    }
}

#[async_trait]
impl PriceSource for StreamSource {
    fn name(&self) -> &str {
        "stream"
    }

    async fn quote(&self) -> Result<PriceQuote, SourceError> {
        let payload = self.client.fetch_event().await.ok_or(SourceError::NoPayload)?;
        let quote = interpret_payload(&payload, self.preferred_timeframe.as_deref()).ok_or(SourceError::NoResult)?;

        if !quote.is_usable() || quote.predicted_price == 0.0 {
            return Err(SourceError::NoResult);
        }
        Ok(quote)
    }
}

/// Page fetch (plain or rendered) followed by the markup cascade
pub struct MarkupSource {
    page_url: String,
    fetchers: Vec<Box<dyn PageFetcher>>,
    extractor: MarkupExtractor,
}

impl MarkupSource {
    pub fn new(page_url: impl Into<String>, fetchers: Vec<Box<dyn PageFetcher>>, extractor: MarkupExtractor) -> Self {
        Self {
            page_url: page_url.into(),
            fetchers,
            extractor,
        }
    }
}

#[async_trait]
impl PriceSource for MarkupSource {
    fn name(&self) -> &str {
        "markup"
    }

    async fn quote(&self) -> Result<PriceQuote, SourceError> {
        let mut last_error = SourceError::NoData;

        for fetcher in &self.fetchers {
            if !fetcher.is_available().await {
                info!("⏭️ Fetcher '{}' not available, skipping", fetcher.name());
                continue;
            }

            let html = match fetcher.fetch(&self.page_url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("⚠️ Fetcher '{}' failed: {}", fetcher.name(), e);
                    last_error = e.into();
                    continue;
                }
            };

            match self.extractor.extract_quote(&html).filter(PriceQuote::is_usable) {
                Some(quote) => return Ok(quote),
                None => {
                    warn!("⚠️ No prices in page from '{}'", fetcher.name());
                    last_error = SourceError::NoData;
                }
            }
        }

        Err(last_error)
    }
}
