//! Infrastructure layer - upstream transports, scraping and delivery

pub mod engine_io;
pub mod markup;
pub mod fetch;
pub mod notify;
