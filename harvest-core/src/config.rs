use crate::export::HeaderLayout;
use harvest_scanner::{
    Base64Fingerprinter, ContentFingerprinter, Selectors, SettleTimings, Sha256Fingerprinter,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerprintKind {
    #[default]
    Base64,
    Sha256,
}

impl FingerprintKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "base64" => Some(FingerprintKind::Base64),
            "sha256" => Some(FingerprintKind::Sha256),
            _ => None,
        }
    }

    pub fn build(&self) -> Arc<dyn ContentFingerprinter> {
        match self {
            FingerprintKind::Base64 => Arc::new(Base64Fingerprinter),
            FingerprintKind::Sha256 => Arc::new(Sha256Fingerprinter),
        }
    }
}

/// Tunables for a harvest run. Defaults match the pacing the target site
/// needs when driven live.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub settle: SettleTimings,
    /// Pause before leaving a finished profile for the next one.
    pub navigate_settle: Duration,
    pub selectors: Selectors,
    pub header_layout: HeaderLayout,
    pub fingerprint: FingerprintKind,
    pub request_timeout: Duration,
    /// Upper bound on page loads in one `execute_harvest` call.
    pub max_page_loads: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            settle: SettleTimings::default(),
            navigate_settle: Duration::from_millis(2000),
            selectors: Selectors::default(),
            header_layout: HeaderLayout::default(),
            fingerprint: FingerprintKind::default(),
            request_timeout: Duration::from_secs(20),
            max_page_loads: 10_000,
        }
    }
}

impl HarvestConfig {
    /// No settle waits. For static documents and tests.
    pub fn fast() -> Self {
        Self {
            settle: SettleTimings::zero(),
            navigate_settle: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_header_layout(mut self, layout: HeaderLayout) -> Self {
        self.header_layout = layout;
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: FingerprintKind) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_page_loads(mut self, max_page_loads: usize) -> Self {
        self.max_page_loads = max_page_loads;
        self
    }
}
