//! Price extraction from server-rendered prediction pages

mod extractor;

pub use extractor::{
    MarkupExtractor, MarkupPrices, BASE_LABEL, DEFAULT_PLAUSIBILITY_FLOOR, DELTA_LABEL, KRONOS_LABEL,
    STATE_LABEL, STOP_LOSS_LABEL, TARGET_LABEL,
};
