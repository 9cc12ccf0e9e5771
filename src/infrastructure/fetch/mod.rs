//! Page fetchers for the markup path

pub mod http_fetcher;
pub mod rendered_fetcher;

use async_trait::async_trait;

use crate::shared::errors::FetchError;

pub use http_fetcher::HttpPageFetcher;
pub use rendered_fetcher::RenderedPageFetcher;

/// Something that can turn a URL into page markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this fetcher can run in the current environment
    async fn is_available(&self) -> bool;

    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
