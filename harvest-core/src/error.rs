use harvest_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Export is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Page load limit of {0} reached without finishing")]
    PageLoadLimit(usize),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
