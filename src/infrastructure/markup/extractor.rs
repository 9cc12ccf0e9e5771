use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use tracing::debug;

use crate::domain::price::{label_value, normalize_number};
use crate::shared::types::{PriceQuote, SourceKind};

pub const BASE_LABEL: &str = "Base:";
pub const TARGET_LABEL: &str = "Target:";
pub const STOP_LOSS_LABEL: &str = "SL:";
pub const KRONOS_LABEL: &str = "Kronos:";
pub const STATE_LABEL: &str = "State:";
pub const DELTA_LABEL: &str = "Δ";

const LABELS: [&str; 6] = [BASE_LABEL, TARGET_LABEL, STOP_LOSS_LABEL, KRONOS_LABEL, STATE_LABEL, DELTA_LABEL];

/// Tertiary search accepts nothing at or below this by default
pub const DEFAULT_PLAUSIBILITY_FLOOR: f64 = 1000.0;

/// Elements whose text never counts as page content
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements considered by the class / currency search
const STRUCTURAL_TAGS: [&str; 20] = [
    "div", "span", "p", "li", "td", "th", "b", "strong", "em", "small", "label", "h1", "h2", "h3", "h4",
    "h5", "h6", "section", "article", "a",
];

const CURRENCY_MARKERS: [&str; 3] = ["$", "USD", "تومان"];

static BADGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)price|badge|value|chip|pill|tag").expect("static class pattern"));

const NUM: &str = r"([0-9۰-۹٠-٩][0-9۰-۹٠-٩,٬.٫]*)";

static BASE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"Base\s*:?\s*{NUM}"),
        format!(r"(?i)base\s*price\s*:?\s*{NUM}"),
        format!(r"قیمت\s*(?:پایه|فعلی)\s*:?\s*{NUM}"),
        format!(r"(?i)(?:XAU|gold)[^0-9۰-۹٠-٩]{{0,20}}{NUM}"),
        format!(r"\$\s*{NUM}"),
        format!(r"{NUM}\s*\$"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static base pattern"))
    .collect()
});

/// Everything the cascade could recover from a page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupPrices {
    pub base_price: Option<f64>,
    pub target_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
    pub kronos_price: Option<f64>,
    pub delta: Option<f64>,
    pub market_state: Option<String>,
}

impl MarkupPrices {
    /// Kronos value, falling back to the target price
    pub fn predicted_price(&self) -> Option<f64> {
        self.kronos_price.or(self.target_price)
    }

    /// `None` unless both the base and the predicted price were found
    pub fn into_quote(self) -> Option<PriceQuote> {
        let base = self.base_price?;
        let predicted = self.predicted_price()?;
        let mut quote = PriceQuote::new(SourceKind::Markup, base, predicted);
        quote.target_price = self.target_price;
        quote.stop_loss_price = self.stop_loss_price;
        quote.market_state = self.market_state;
        Some(quote)
    }
}

/// Staged search over server-rendered markup
#[derive(Debug, Clone)]
pub struct MarkupExtractor {
    plausibility_floor: f64,
}

impl Default for MarkupExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PLAUSIBILITY_FLOOR)
    }
}

impl MarkupExtractor {
    pub fn new(plausibility_floor: f64) -> Self {
        Self { plausibility_floor }
    }

    pub fn extract_quote(&self, html: &str) -> Option<PriceQuote> {
        self.extract(html).into_quote()
    }

    pub fn extract(&self, html: &str) -> MarkupPrices {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let fragments = visible_fragments(root);

        let price = |label: &str| {
            fragment_value(&fragments, label, is_price)
                .or_else(|| {
                    let found = badge_value(root, label);
                    if found.is_some() {
                        debug!("{} found by element search", label);
                    }
                    found
                })
        };

        let mut prices = MarkupPrices {
            base_price: price(BASE_LABEL),
            target_price: price(TARGET_LABEL),
            stop_loss_price: price(STOP_LOSS_LABEL),
            kronos_price: fragment_value(&fragments, KRONOS_LABEL, is_price),
            delta: fragment_value(&fragments, DELTA_LABEL, |v| v.is_finite()),
            market_state: fragment_text(&fragments, STATE_LABEL),
        };

        if prices.base_price.is_none() {
            prices.base_price = self.pattern_base_price(&unlabelled_text(&fragments));
            if prices.base_price.is_some() {
                debug!("Base price found by page-wide pattern search");
            }
        }

        prices
    }

    fn pattern_base_price(&self, text: &str) -> Option<f64> {
        BASE_PATTERNS.iter().find_map(|pattern| {
            pattern
                .captures_iter(text)
                .filter_map(|caps| caps.get(1).and_then(|m| normalize_number(m.as_str())))
                .find(|v| *v > self.plausibility_floor)
        })
    }
}

fn is_price(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_hidden(element: &ElementRef<'_>) -> bool {
    HIDDEN_TAGS.contains(&element.value().name())
}

/// Trimmed, non-empty text nodes in document order, minus script/style content
fn visible_fragments(scope: ElementRef<'_>) -> Vec<String> {
    scope
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().filter_map(ElementRef::wrap).any(|el| is_hidden(&el));
            let text = text.trim();
            (!hidden && !text.is_empty()).then(|| text.to_string())
        })
        .collect()
}

/// Page text minus every fragment that belongs to a non-base label, either
/// inline (`Target: 2660 $`) or as the value right after a bare label.
fn unlabelled_text(fragments: &[String]) -> String {
    let other_label = |f: &str| LABELS.iter().filter(|l| **l != BASE_LABEL).any(|l| f.contains(l));
    fragments
        .iter()
        .enumerate()
        .filter(|(i, f)| {
            let after_bare_label = i
                .checked_sub(1)
                .and_then(|prev| fragments.get(prev))
                .map_or(false, |prev| other_label(prev) && label_value_missing(prev));
            !other_label(f) && !after_bare_label
        })
        .map(|(_, f)| f.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a labelled fragment carries no number after its label
fn label_value_missing(fragment: &str) -> bool {
    LABELS
        .iter()
        .filter_map(|l| fragment.split_once(l).map(|(_, rest)| rest))
        .all(|rest| normalize_number(rest).is_none())
}

/// Fragment right after `idx`, unless it belongs to another label
fn adjacent(fragments: &[String], idx: usize) -> Option<&str> {
    fragments
        .get(idx + 1)
        .map(String::as_str)
        .filter(|next| !LABELS.iter().any(|l| next.contains(l)))
}

/// Value after `label` in the first fragment carrying it, else in the next fragment
fn fragment_value(fragments: &[String], label: &str, accept: impl Fn(f64) -> bool) -> Option<f64> {
    let idx = fragments.iter().position(|f| f.contains(label))?;
    label_value(&fragments[idx], label)
        .filter(|v| accept(*v))
        .or_else(|| adjacent(fragments, idx).and_then(normalize_number).filter(|v| accept(*v)))
}

fn fragment_text(fragments: &[String], label: &str) -> Option<String> {
    let idx = fragments.iter().position(|f| f.contains(label))?;
    let inline = fragments[idx]
        .split_once(label)
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|rest| !rest.is_empty());
    inline.or_else(|| adjacent(fragments, idx).map(str::to_string))
}

/// Smallest badge-like or currency-bearing element mentioning `label`
fn badge_value(root: ElementRef<'_>, label: &str) -> Option<f64> {
    let mut candidates: Vec<String> = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| STRUCTURAL_TAGS.contains(&el.value().name()))
        .filter_map(|el| {
            let text = visible_fragments(el).join(" ");
            if !text.contains(label) {
                return None;
            }
            let badge = el.value().attr("class").map_or(false, |c| BADGE_CLASS.is_match(c));
            let currency = CURRENCY_MARKERS.iter().any(|m| text.contains(m));
            (badge || currency).then_some(text)
        })
        .collect();

    candidates.sort_by_key(|text| text.chars().count());
    candidates
        .iter()
        .filter_map(|text| label_value(text, label))
        .find(|v| is_price(*v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> MarkupPrices {
        MarkupExtractor::default().extract(html)
    }

    #[test]
    fn test_script_content_is_ignored() {
        let html = r#"<html><head><script>var tpl = "Base: 12";</script>
            <style>.x:after{content:"Base: 5"}</style></head>
            <body><div>Base: 2651.20 $</div><div>Kronos: 2655.00</div></body></html>"#;
        let prices = extract(html);
        assert_eq!(prices.base_price, Some(2651.20));
        assert_eq!(prices.predicted_price(), Some(2655.00));
    }

    #[test]
    fn test_primary_labels() {
        let html = r#"<div class="card">
            <p>Base: ۲٬۶۵۰٫۰۰ $</p>
            <p>Target: 2,660.00 $</p>
            <p>SL: 2,645.00</p>
            <p>Kronos: 2,658.40</p>
            <p>Δ +8.40</p>
            <p>State: صعودی</p>
        </div>"#;
        let prices = extract(html);
        assert_eq!(prices.base_price, Some(2650.0));
        assert_eq!(prices.target_price, Some(2660.0));
        assert_eq!(prices.stop_loss_price, Some(2645.0));
        assert_eq!(prices.kronos_price, Some(2658.4));
        assert_eq!(prices.delta, Some(8.4));
        assert_eq!(prices.market_state.as_deref(), Some("صعودی"));
    }

    #[test]
    fn test_value_in_adjacent_element() {
        let html = r#"<div><span>Base:</span><span>2650.50</span>
            <span>Kronos:</span> <b>2644.10</b>
            <span>State:</span><span>bearish</span></div>"#;
        let prices = extract(html);
        assert_eq!(prices.base_price, Some(2650.5));
        assert_eq!(prices.kronos_price, Some(2644.1));
        assert_eq!(prices.market_state.as_deref(), Some("bearish"));
    }

    #[test]
    fn test_non_positive_price_is_rejected() {
        let html = r#"<div><p>Base: 0.00</p><p>Kronos: -5</p><p>Target: 2660</p></div>"#;
        let prices = extract(html);
        assert_eq!(prices.base_price, None);
        assert_eq!(prices.kronos_price, None);
        assert_eq!(prices.predicted_price(), Some(2660.0));
    }

    #[test]
    fn test_kronos_falls_back_to_target() {
        let html = r#"<div><p>Base: 2650</p><p>Target: 2662.5</p></div>"#;
        let quote = MarkupExtractor::default().extract_quote(html).unwrap();
        assert_eq!(quote.base_price, 2650.0);
        assert_eq!(quote.predicted_price, 2662.5);
        assert_eq!(quote.source, SourceKind::Markup);
    }

    #[test]
    fn test_badge_search_when_primary_misses() {
        // the first fragment holding the label carries no number
        let html = r#"<div>
            <p>Base: updating</p><p>please wait</p>
            <span class="price-badge">Base: 2,649.90</span>
            <div>Target: soon</div><div><em>n/a</em></div>
            <div>Target: 2,661.00 USD</div>
        </div>"#;
        let prices = extract(html);
        assert_eq!(prices.base_price, Some(2649.9));
        assert_eq!(prices.target_price, Some(2661.0));
    }

    #[test]
    fn test_pattern_search_respects_floor() {
        let html = r#"<div><h2>Gold spot</h2><p>Spread 12 $</p><p>Last: $ 2,651.30</p><p>Target: 2660</p></div>"#;
        let prices = extract(html);
        assert_eq!(prices.base_price, Some(2651.3));

        let small = r#"<div><p>Spread 12 $</p><p>Target: 2660</p></div>"#;
        assert_eq!(extract(small).base_price, None);
        assert!(MarkupExtractor::default().extract_quote(small).is_none());
    }

    #[test]
    fn test_pattern_search_skips_other_labels() {
        let html = r#"<div><p>Target: 2,660.00 $</p><p>Kronos: 2,662.00</p></div>"#;
        let prices = extract(html);
        assert_eq!(prices.base_price, None);
        assert_eq!(prices.target_price, Some(2660.0));
        assert!(MarkupExtractor::default().extract_quote(html).is_none());

        // value in the element after a bare label is excluded as well
        let html = r#"<div><span>SL:</span><span>2,645.00 $</span><p>Kronos: 2,662.00</p></div>"#;
        assert_eq!(extract(html).base_price, None);

        let html = r#"<div><p>Target: 2,660.00 $</p><p>Spot $ 2,651.40</p><p>Kronos: 2,662.00</p></div>"#;
        assert_eq!(extract(html).base_price, Some(2651.4));
    }

    #[test]
    fn test_custom_floor() {
        let html = r#"<div><p>Base price 95.20</p><p>Kronos: 97.00</p></div>"#;
        assert_eq!(MarkupExtractor::default().extract(html).base_price, None);
        assert_eq!(MarkupExtractor::new(50.0).extract(html).base_price, Some(95.2));
    }

    #[test]
    fn test_empty_page() {
        assert_eq!(extract(""), MarkupPrices::default());
        assert!(MarkupExtractor::default().extract_quote("<html></html>").is_none());
    }
}
