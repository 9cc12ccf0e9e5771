//! Price domain - numeral normalization and label extraction

mod numeric;

pub use numeric::{label_value, normalize_number, to_ascii_numerals};
