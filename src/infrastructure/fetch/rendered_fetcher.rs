use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use super::PageFetcher;
use crate::shared::errors::FetchError;

/// Renders the page in a headless Chromium-compatible browser and returns the
/// resulting DOM, for pages that only fill in prices from scripts.
pub struct RenderedPageFetcher {
    binary: String,
    timeout: Duration,
}

impl RenderedPageFetcher {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self { binary: binary.into(), timeout }
    }

    /// Absolute path of the browser binary, looking through `PATH` for bare names
    pub fn resolve_binary(&self) -> Option<PathBuf> {
        let candidate = Path::new(&self.binary);
        if candidate.components().count() > 1 {
            return candidate.is_file().then(|| candidate.to_path_buf());
        }

        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(&self.binary))
            .find(|path| path.is_file())
    }

    fn args(url: &str) -> [&str; 6] {
        ["--headless", "--disable-gpu", "--no-sandbox", "--virtual-time-budget=5000", "--dump-dom", url]
    }
}

#[async_trait]
impl PageFetcher for RenderedPageFetcher {
    fn name(&self) -> &str {
        "headless-browser"
    }

    async fn is_available(&self) -> bool {
        self.resolve_binary().is_some()
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let binary = self
            .resolve_binary()
            .ok_or_else(|| FetchError::RendererUnavailable(self.binary.clone()))?;

        info!("🧭 Rendering {} with {}", url, binary.display());
        let mut command = Command::new(&binary);
        command.args(Self::args(url)).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| FetchError::RendererTimeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("⚠️ Renderer exited with {}", output.status);
            return Err(FetchError::RendererFailed(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
