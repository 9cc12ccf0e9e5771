// src/report.rs
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::FailedAttempt;
use crate::shared::types::{PriceSnapshot, DIVERGENCE_THRESHOLD};

#[derive(Debug, Serialize)]
pub struct AlertReport {
    pub snapshot: PriceSnapshot,
    pub threshold: f64,
    pub generated_at: DateTime<Utc>,
}

impl AlertReport {
    pub fn new(snapshot: PriceSnapshot) -> Self {
        Self {
            snapshot,
            threshold: DIVERGENCE_THRESHOLD,
            generated_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Telegram alert body (HTML parse mode)
    pub fn to_message(&self) -> String {
        let s = &self.snapshot;
        let mut lines = vec![
            "📡 <b>Kronos signal</b>".to_string(),
            String::new(),
            format!("⏰ Time: {}", escape_html(&s.timestamp)),
        ];
        if let Some(tf) = &s.timeframe {
            lines.push(format!("🕒 Timeframe: {}", escape_html(tf)));
        }
        lines.push(String::new());
        lines.push(format!("💰 Base price: <code>{} $</code>", format_price(s.base_price)));
        lines.push(format!("🔮 Kronos price: <code>{} $</code>", format_price(s.predicted_price)));
        lines.push(format!(
            "{} Difference: <code>{:+.2} $</code>",
            if s.difference >= 0.0 { "📈" } else { "📉" },
            s.difference
        ));
        if let Some(target) = s.target_price {
            lines.push(format!("🎯 Target: <code>{} $</code>", format_price(target)));
        }
        if let Some(stop) = s.stop_loss_price {
            lines.push(format!("🛑 Stop loss: <code>{} $</code>", format_price(stop)));
        }
        if let Some(state) = &s.market_state {
            lines.push(format!("🌡 Market state: {}", escape_html(state)));
        }
        if let Some(server_time) = &s.server_time {
            lines.push(format!("🕐 Server time: {}", escape_html(server_time)));
        }
        if let Some(decision) = &s.decision {
            lines.push(format!("🧭 Decision: {}", escape_html(decision)));
        }
        if let Some(confidence) = s.confidence {
            lines.push(format!("📊 Confidence: {:.3}", confidence));
        }
        lines.push(format!("🔗 Source: {}", s.source.as_str()));
        lines.join("\n")
    }
}

/// Operator message for a run where every source failed
pub fn failure_message(attempts: &[FailedAttempt]) -> String {
    let mut lines = vec!["❌ <b>Kronos notifier error</b>: no price data".to_string()];
    for attempt in attempts {
        lines.push(format!("• {}: {}", escape_html(&attempt.source), escape_html(&attempt.error.to_string())));
    }
    lines.join("\n")
}

/// `2650.5` -> `2,650.50`
pub fn format_price(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
