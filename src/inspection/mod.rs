//! Inspection-side bookkeeping: counters, status indicator, defect patterns

pub mod context;
pub mod stats;

pub use context::{InspectionContext, InspectionStatus};
pub use stats::{DefectShares, InspectionStatistics};
