//! Typed view of the `update_all` event payload.
//!
//! Every field is optional. Numeric fields stay as raw JSON values because
//! upstream sends them either as numbers or as formatted strings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::price::normalize_number;

/// Top-level envelope. Each section is read independently so a malformed or
/// null sibling never hides a valid timeframe record.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePayload {
    #[serde(default, deserialize_with = "lenient")]
    pub results: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub market_conditions: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub kronos_data: Option<KronosData>,
    #[serde(default, deserialize_with = "lenient")]
    pub news: Option<NewsInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimeframeResult {
    #[serde(default)]
    pub base_price: Option<Value>,
    #[serde(default)]
    pub prediction: Option<Value>,
    #[serde(default)]
    pub kronos_pred: Option<Value>,
    #[serde(default)]
    pub target_price: Option<Value>,
    #[serde(default)]
    pub stop_loss: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketCondition {
    /// Localized (Persian) label
    #[serde(default, deserialize_with = "lenient")]
    pub condition_fa: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub condition: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KronosData {
    #[serde(default)]
    pub predicted_price: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub decision: Option<String>,
    #[serde(default)]
    pub confidence: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsInfo {
    #[serde(default)]
    pub last_update: Option<Value>,
}

/// Wrong type or null becomes the default instead of failing the parent
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

impl UpdatePayload {
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    /// Timeframe records that are JSON objects; anything else under `results` is skipped
    pub fn records(&self) -> BTreeMap<String, TimeframeResult> {
        self.results
            .iter()
            .filter(|(_, v)| v.is_object())
            .filter_map(|(k, v)| Some((k.clone(), TimeframeResult::deserialize(v).ok()?)))
            .collect()
    }

    pub fn market_state(&self, timeframe: &str) -> Option<String> {
        let condition = self.market_conditions.get(timeframe)?;
        MarketCondition::deserialize(condition).ok()?.label()
    }
}

impl MarketCondition {
    pub fn label(&self) -> Option<String> {
        non_empty(self.condition_fa.as_deref()).or_else(|| non_empty(self.condition.as_deref()))
    }
}

/// Numbers pass through; strings go through the numeral normalizer.
pub fn price_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => normalize_number(s),
        _ => None,
    }
}

pub fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
