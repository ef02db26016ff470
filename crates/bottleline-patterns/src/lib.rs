pub mod defect;
pub mod aggregator;
pub mod sequence;
pub mod insight;

pub use defect::{DefectCounts, DefectSet, DefectType, ParseDefectError};
pub use aggregator::{
    DefectPatterns, PatternAlert, SlotRecord, DEFAULT_LINE_LENGTH, PATTERN_ALERT_THRESHOLD,
};
pub use sequence::{classify, SequenceShape, MIN_SEQUENCE_LEN};
pub use insight::{
    defect_rate, derive_insights, Insight, InsightKind, HOTSPOT_RATE_THRESHOLD, MAX_CONFIDENCE,
};
