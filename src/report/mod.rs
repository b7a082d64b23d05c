//! Report module - evaluation metrics, console summary and JSON export

pub mod metrics;
pub mod run_report;
pub mod summary;

pub use metrics::*;
pub use run_report::*;
pub use summary::*;
