//! Numeral normalization for mixed-script price text

use regex::Regex;
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?[0-9]+(?:\.[0-9]+)?").expect("static number pattern"));

/// Map Persian / Arabic-Indic digits to ASCII, drop thousands separators and
/// turn the Arabic decimal separator into a dot.
pub fn to_ascii_numerals(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '۰'..='۹' => char::from_digit(c as u32 - '۰' as u32, 10),
            '٠'..='٩' => char::from_digit(c as u32 - '٠' as u32, 10),
            ',' | '٬' => None,
            '٫' => Some('.'),
            other => Some(other),
        })
        .collect()
}

/// First signed, optionally fractional number in `text`
pub fn normalize_number(text: &str) -> Option<f64> {
    let ascii = to_ascii_numerals(text);
    NUMBER
        .find(&ascii)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Number following the first occurrence of `label`.
///
/// Falls through to the whole text when the label is absent.
pub fn label_value(text: &str, label: &str) -> Option<f64> {
    let rest = text.split_once(label).map(|(_, rest)| rest).unwrap_or(text);
    normalize_number(rest)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Digit `d` in ASCII (0), Persian (1) or Arabic-Indic (2) script
    fn script_digit(d: u32, script: u8) -> char {
        let zero = match script {
            1 => '۰',
            2 => '٠',
            _ => '0',
        };
        char::from_u32(zero as u32 + d).unwrap()
    }

    proptest! {
        #[test]
        fn prop_mixed_scripts_normalize_like_ascii(
            int_digits in prop::collection::vec((0u32..10, 0u8..3, any::<bool>(), any::<bool>()), 1..8),
            frac_digits in prop::collection::vec((0u32..10, 0u8..3), 0..5),
            arabic_point in any::<bool>(),
        ) {
            let mut plain = String::new();
            let mut mixed = String::new();

            for (i, (d, script, separate, arabic_sep)) in int_digits.iter().enumerate() {
                plain.push(char::from_digit(*d, 10).unwrap());
                mixed.push(script_digit(*d, *script));
                if *separate && i + 1 < int_digits.len() {
                    mixed.push(if *arabic_sep { '٬' } else { ',' });
                }
            }
            if !frac_digits.is_empty() {
                plain.push('.');
                mixed.push(if arabic_point { '٫' } else { '.' });
                for (d, script) in &frac_digits {
                    plain.push(char::from_digit(*d, 10).unwrap());
                    mixed.push(script_digit(*d, *script));
                }
            }

            let expected = plain.parse::<f64>().unwrap();
            prop_assert_eq!(normalize_number(&plain), Some(expected));
            prop_assert_eq!(normalize_number(&mixed), Some(expected), "mixed {:?}", mixed);
        }
    }
}
