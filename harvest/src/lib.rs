pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    build_config, describe_outcome, format_snapshot, format_summary, resolve_db_path,
};

// Re-export traversal entry points from harvest-core
pub use harvest_core::harvest::{
    Continuation, HarvestProgressCallback, HarvestSummary, PageOutcome, execute_harvest,
    visit_once,
};
