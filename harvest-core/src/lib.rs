pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod harvest;
pub mod queue;
pub mod store;

pub use config::{FingerprintKind, HarvestConfig};
pub use enrich::{EnrichmentRow, REQUIRED_COLUMNS, profile_query, read_for_enrichment};
pub use error::{HarvestError, Result};
pub use export::{DirectorySink, DownloadSink, Exporter, HeaderLayout, MemorySink};
pub use harvest::{
    CompanyExport, Continuation, DriverState, HarvestSummary, Harvester, HtmlLoader, PageKind,
    PageLoader, PageOutcome, execute_harvest, visit_once,
};
pub use queue::{CompanyTarget, NavigationQueue, QueueSnapshot};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
