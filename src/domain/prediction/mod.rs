//! Prediction domain - interpreting the streamed prediction payload

pub mod payload;

use serde_json::Value;
use std::collections::BTreeMap;

use crate::shared::types::{PriceQuote, SourceKind};
use payload::{price_from_value, text_from_value, UpdatePayload};

/// Timeframes in the order they are preferred when no explicit choice is made
pub const TIMEFRAME_PREFERENCE: [&str; 9] = ["H1", "M30", "M15", "M5", "M1", "H4", "D1", "W1", "MN"];

/// Pick the timeframe to report on.
///
/// Preferred key if present, otherwise the first key of
/// [`TIMEFRAME_PREFERENCE`], otherwise the lexicographically smallest key.
pub fn select_timeframe<'a, V>(results: &'a BTreeMap<String, V>, preferred: Option<&str>) -> Option<&'a str> {
    if let Some(key) = preferred.and_then(|p| results.get_key_value(p)).map(|(k, _)| k) {
        return Some(key.as_str());
    }

    TIMEFRAME_PREFERENCE
        .iter()
        .find_map(|tf| results.get_key_value(*tf).map(|(k, _)| k.as_str()))
        .or_else(|| results.keys().next().map(String::as_str))
}

/// Target and stop-loss around `base`: target is the prediction, the stop sits
/// half the divergence away on the opposite side of the predicted move.
pub fn derive_levels(base: f64, predicted: f64) -> (f64, f64) {
    let half = 0.5 * (predicted - base).abs();
    let stop_loss = if predicted > base { base - half } else { base + half };
    (predicted, stop_loss)
}

/// Turn an `update_all` payload into a quote, or `None` when it has no usable result
pub fn interpret_payload(payload: &Value, preferred: Option<&str>) -> Option<PriceQuote> {
    let payload = UpdatePayload::from_value(payload)?;
    let records = payload.records();
    let timeframe = select_timeframe(&records, preferred)?;
    let record = records.get(timeframe)?;

    let base_price = record
        .base_price
        .as_ref()
        .and_then(price_from_value)
        .filter(|v| *v > 0.0)?;

    // zero means "not provided" upstream
    let predicted_price = [record.prediction.as_ref(), record.kronos_pred.as_ref()]
        .into_iter()
        .flatten()
        .chain(payload.kronos_data.as_ref().and_then(|k| k.predicted_price.as_ref()))
        .filter_map(price_from_value)
        .find(|v| *v != 0.0)
        .unwrap_or(base_price);

    let (derived_target, derived_stop) = derive_levels(base_price, predicted_price);
    let target_price = record.target_price.as_ref().and_then(price_from_value).unwrap_or(derived_target);
    let stop_loss_price = record.stop_loss.as_ref().and_then(price_from_value).unwrap_or(derived_stop);

    let server_time = record
        .timestamp
        .as_ref()
        .and_then(text_from_value)
        .or_else(|| payload.news.as_ref().and_then(|n| n.last_update.as_ref()).and_then(text_from_value));

    let mut quote = PriceQuote::new(SourceKind::Stream, base_price, predicted_price);
    quote.target_price = Some(target_price);
    quote.stop_loss_price = Some(stop_loss_price);
    quote.market_state = payload.market_state(timeframe);
    quote.timeframe = Some(timeframe.to_string());
    quote.server_time = server_time;
    if let Some(kronos) = &payload.kronos_data {
        quote.decision = kronos.decision.clone().filter(|d| !d.trim().is_empty());
        quote.confidence = kronos.confidence.as_ref().and_then(price_from_value);
    }

    Some(quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(list: &[&str]) -> BTreeMap<String, ()> {
        list.iter().map(|k| (k.to_string(), ())).collect()
    }

    #[test]
    fn test_timeframe_preference_order() {
        assert_eq!(select_timeframe(&keys(&["M15", "D1"]), None), Some("M15"));
        assert_eq!(select_timeframe(&keys(&["D1", "H4", "H1"]), None), Some("H1"));
    }

    #[test]
    fn test_timeframe_preferred_key() {
        assert_eq!(select_timeframe(&keys(&["M15", "D1"]), Some("D1")), Some("D1"));
        // missing preferred key falls back to the preference order
        assert_eq!(select_timeframe(&keys(&["M15", "D1"]), Some("H1")), Some("M15"));
    }

    #[test]
    fn test_timeframe_unknown_keys_pick_smallest() {
        assert_eq!(select_timeframe(&keys(&["m15", "1h", "h1"]), None), Some("1h"));
        assert_eq!(select_timeframe(&keys(&[]), None), None);
    }

    #[test]
    fn test_derive_levels() {
        assert_eq!(derive_levels(2650.0, 2660.0), (2660.0, 2645.0));
        assert_eq!(derive_levels(2650.0, 2640.0), (2640.0, 2655.0));
        assert_eq!(derive_levels(2650.0, 2650.0), (2650.0, 2650.0));
    }

    #[test]
    fn test_interpret_full_payload() {
        let payload = json!({
            "results": {
                "H1": { "base_price": "2,650.00", "prediction": 2660.0, "timestamp": "2025-01-01 10:00" },
                "M15": { "base_price": 2649.0, "prediction": 2651.0 }
            },
            "market_conditions": {
                "H1": { "condition_fa": "صعودی", "condition": "bullish" }
            },
            "kronos_data": { "decision": "BUY", "confidence": 0.71 }
        });

        let quote = interpret_payload(&payload, None).expect("quote");
        assert_eq!(quote.timeframe.as_deref(), Some("H1"));
        assert_eq!(quote.base_price, 2650.0);
        assert_eq!(quote.predicted_price, 2660.0);
        assert_eq!(quote.target_price, Some(2660.0));
        assert_eq!(quote.stop_loss_price, Some(2645.0));
        assert_eq!(quote.market_state.as_deref(), Some("صعودی"));
        assert_eq!(quote.server_time.as_deref(), Some("2025-01-01 10:00"));
        assert_eq!(quote.decision.as_deref(), Some("BUY"));
        assert_eq!(quote.confidence, Some(0.71));
    }

    #[test]
    fn test_interpret_prediction_fallbacks() {
        let kronos_pred = json!({ "results": { "M15": { "base_price": 2650.0, "kronos_pred": 2640.0 } } });
        let quote = interpret_payload(&kronos_pred, None).expect("quote");
        assert_eq!(quote.predicted_price, 2640.0);
        assert_eq!(quote.stop_loss_price, Some(2655.0));

        let kronos_data = json!({
            "results": { "H1": { "base_price": 2650.0 } },
            "kronos_data": { "predicted_price": "2655.5" },
            "news": { "last_update": "10:05" }
        });
        let quote = interpret_payload(&kronos_data, None).expect("quote");
        assert_eq!(quote.predicted_price, 2655.5);
        assert_eq!(quote.server_time.as_deref(), Some("10:05"));

        let base_only = json!({ "results": { "H1": { "base_price": 2650.0, "prediction": 0 } } });
        let quote = interpret_payload(&base_only, None).expect("quote");
        assert_eq!(quote.predicted_price, 2650.0);
    }

    #[test]
    fn test_interpret_supplied_levels_win() {
        let payload = json!({
            "results": { "H1": { "base_price": 2650.0, "prediction": 2660.0, "target_price": 2670.0, "stop_loss": 2640.0 } },
            "market_conditions": { "H1": { "condition": "ranging" } }
        });
        let quote = interpret_payload(&payload, None).expect("quote");
        assert_eq!(quote.target_price, Some(2670.0));
        assert_eq!(quote.stop_loss_price, Some(2640.0));
        assert_eq!(quote.market_state.as_deref(), Some("ranging"));
    }

    #[test]
    fn test_interpret_rejects_empty_or_malformed() {
        assert!(interpret_payload(&json!({}), None).is_none());
        assert!(interpret_payload(&json!({ "results": {} }), None).is_none());
        assert!(interpret_payload(&json!({ "results": [1, 2] }), None).is_none());
        assert!(interpret_payload(&json!({ "results": { "H1": { "prediction": 2650.0 } } }), None).is_none());
        assert!(interpret_payload(&json!("update"), None).is_none());
    }

    fn valid_h1() -> Value {
        json!({ "H1": { "base_price": 2650.0, "prediction": 2660.0 } })
    }

    #[test]
    fn test_null_market_conditions_keep_result() {
        let payload = json!({ "results": valid_h1(), "market_conditions": null });
        let quote = interpret_payload(&payload, None).expect("quote");
        assert_eq!(quote.predicted_price, 2660.0);
        assert_eq!(quote.market_state, None);

        let payload = json!({ "results": valid_h1(), "market_conditions": { "H1": "up" } });
        assert_eq!(interpret_payload(&payload, None).expect("quote").market_state, None);
    }

    #[test]
    fn test_non_object_sibling_in_results_is_skipped() {
        let payload = json!({
            "results": { "H1": { "base_price": 2650.0, "prediction": 2660.0 }, "updated": "10:00" }
        });
        let quote = interpret_payload(&payload, None).expect("quote");
        assert_eq!(quote.timeframe.as_deref(), Some("H1"));

        // a lone non-record key is never selected
        let payload = json!({ "results": { "updated": "10:00" } });
        assert!(interpret_payload(&payload, None).is_none());
    }

    #[test]
    fn test_mistyped_kronos_fields_are_ignored() {
        let payload = json!({
            "results": valid_h1(),
            "kronos_data": { "decision": 1, "confidence": "0.8" },
            "news": "stale"
        });
        let quote = interpret_payload(&payload, None).expect("quote");
        assert_eq!(quote.decision, None);
        assert_eq!(quote.confidence, Some(0.8));
        assert_eq!(quote.server_time, None);

        let payload = json!({ "results": valid_h1(), "kronos_data": [1, 2] });
        assert_eq!(interpret_payload(&payload, None).expect("quote").predicted_price, 2660.0);
    }
}
