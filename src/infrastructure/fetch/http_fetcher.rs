use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use super::PageFetcher;
use crate::shared::errors::FetchError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Plain HTTP GET
pub struct HttpPageFetcher {
    http_client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http_client = Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        info!("🔍 Fetching page {}", url);
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        Ok(response.text().await?)
    }
}
