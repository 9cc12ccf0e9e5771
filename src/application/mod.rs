//! Application layer - acquisition use case and CLI commands

pub mod acquisition;
pub mod commands;
pub mod sources;

pub use acquisition::{Acquisition, AcquisitionOrchestrator, FailedAttempt};
pub use commands::{Cli, Commands};
pub use sources::{MarkupSource, PriceSource, StreamSource};
