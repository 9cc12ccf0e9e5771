//! Minimal Engine.IO v4 long-polling client

pub mod framing;
mod client;

pub use client::{find_event, parse_session_id, EngineIoClient, EngineIoConfig};
