//! Kronos notifier - watches the Kronos gold prediction server and alerts
//! when the predicted price diverges from the base price

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::{Acquisition, AcquisitionOrchestrator, PriceSource};
pub use domain::prediction::interpret_payload;
pub use infrastructure::engine_io::EngineIoClient;
pub use infrastructure::markup::MarkupExtractor;
pub use shared::types::{PriceQuote, PriceSnapshot, SourceKind, DIVERGENCE_THRESHOLD};
