//! Output formatters for lineage results

pub mod json;
pub mod pretty;
