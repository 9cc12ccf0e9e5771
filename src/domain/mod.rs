//! Domain layer - price parsing and prediction interpretation

pub mod price;
pub mod prediction;
