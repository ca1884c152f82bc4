pub mod driver;
pub mod error;
pub mod extractor;
pub mod fingerprint;
pub mod page;
pub mod record;

pub use driver::{DriverOutcome, DriverState, PaginationDriver, SettleTimings};
pub use error::ScanError;
pub use extractor::ReviewExtractor;
pub use fingerprint::{Base64Fingerprinter, ContentFingerprinter, Fingerprint, Sha256Fingerprinter};
pub use page::{HtmlPage, NextControl, PageSelectors, ReviewBlock, ReviewPage, Selectors};
pub use record::{NOT_AVAILABLE, ReviewRecord};
