//! Acquisition orchestrator - ordered price sources, first success wins

use std::time::Duration;
use tracing::{info, warn};

use super::sources::PriceSource;
use crate::shared::errors::SourceError;
use crate::shared::types::PriceSnapshot;

/// A source that produced nothing
#[derive(Debug, Clone, PartialEq)]
pub struct FailedAttempt {
    pub source: String,
    pub error: SourceError,
}

/// Outcome of one acquisition run
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    Snapshot(PriceSnapshot),
    Failed { attempts: Vec<FailedAttempt> },
}

impl Acquisition {
    pub fn snapshot(&self) -> Option<&PriceSnapshot> {
        match self {
            Acquisition::Snapshot(snapshot) => Some(snapshot),
            Acquisition::Failed { .. } => None,
        }
    }
}

pub struct AcquisitionOrchestrator {
    sources: Vec<Box<dyn PriceSource>>,
    source_timeout: Duration,
}

impl AcquisitionOrchestrator {
    pub fn new(sources: Vec<Box<dyn PriceSource>>, source_timeout: Duration) -> Self {
        Self {
            sources,
            source_timeout,
        }
    }

    /// Try each source once, in order
    pub async fn acquire(&self) -> Acquisition {
        let mut attempts = Vec::new();

        for source in &self.sources {
            info!("🔄 Trying {} source", source.name());

            let outcome = tokio::time::timeout(self.source_timeout, source.quote())
                .await
                .unwrap_or(Err(SourceError::Timeout(self.source_timeout.as_secs())));

            match outcome {
                Ok(quote) => {
                    let snapshot = PriceSnapshot::from_quote(quote, capture_time());
                    info!(
                        "✅ {} source: base={:.2} predicted={:.2} diff={:+.2}",
                        source.name(),
                        snapshot.base_price,
                        snapshot.predicted_price,
                        snapshot.difference
                    );
                    return Acquisition::Snapshot(snapshot);
                }
                Err(error) => {
                    warn!("⚠️ {} source failed: {}", source.name(), error);
                    attempts.push(FailedAttempt {
                        source: source.name().to_string(),
                        error,
                    });
                }
            }
        }

        Acquisition::Failed { attempts }
    }
}

/// Local wall-clock capture time
fn capture_time() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
