//! Common types used across the application

use serde::{Deserialize, Serialize};

/// Divergence (in price units) above which an alert is sent
pub const DIVERGENCE_THRESHOLD: f64 = 3.5;

/// Which acquisition strategy produced a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Stream,
    Markup,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Stream => "stream",
            SourceKind::Markup => "markup",
        }
    }
}

/// Raw values reported by a single price source, before any decision is made
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub source: SourceKind,
    pub base_price: f64,
    pub predicted_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
    pub market_state: Option<String>,
    pub timeframe: Option<String>,
    pub server_time: Option<String>,
    pub decision: Option<String>,
    pub confidence: Option<f64>,
}

impl PriceQuote {
    pub fn new(source: SourceKind, base_price: f64, predicted_price: f64) -> Self {
        Self {
            source,
            base_price,
            predicted_price,
            target_price: None,
            stop_loss_price: None,
            market_state: None,
            timeframe: None,
            server_time: None,
            decision: None,
            confidence: None,
        }
    }

    /// Both prices must be finite and the base price strictly positive
    pub fn is_usable(&self) -> bool {
        self.base_price.is_finite() && self.base_price > 0.0 && self.predicted_price.is_finite()
    }
}

/// Result of one successful acquisition.
///
/// Build it with [`PriceSnapshot::from_quote`], which derives `difference` and
/// `should_notify` from the two prices. The fields stay public for reporting;
/// mutating a price afterwards does not update the derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub source: SourceKind,
    pub base_price: f64,
    pub predicted_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
    pub market_state: Option<String>,
    pub timeframe: Option<String>,
    pub server_time: Option<String>,
    pub decision: Option<String>,
    pub confidence: Option<f64>,
    pub difference: f64,
    pub should_notify: bool,
    pub timestamp: String,
}

impl PriceSnapshot {
    pub fn from_quote(quote: PriceQuote, timestamp: String) -> Self {
        let difference = quote.predicted_price - quote.base_price;
        Self {
            source: quote.source,
            base_price: quote.base_price,
            predicted_price: quote.predicted_price,
            target_price: quote.target_price,
            stop_loss_price: quote.stop_loss_price,
            market_state: quote.market_state,
            timeframe: quote.timeframe,
            server_time: quote.server_time,
            decision: quote.decision,
            confidence: quote.confidence,
            difference,
            should_notify: difference.abs() > DIVERGENCE_THRESHOLD,
            timestamp,
        }
    }
}
