//! Services Layer
//!
//! Business operations that span several repositories or need a
//! transaction. Handlers call these or the repositories directly.

pub mod acquisition_service;
pub mod bulk_service;
pub mod figure_service;

// Re-export for convenience
pub use bulk_service::{BulkOutcome, BulkSummary, RecordOutcome};
pub use figure_service::register_figure;
