use crate::extractor::ReviewExtractor;
use crate::fingerprint::{Base64Fingerprinter, ContentFingerprinter, Fingerprint};
use crate::page::{NextControl, ReviewBlock, ReviewPage};
use crate::record::ReviewRecord;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Waits inserted so asynchronously rendered content can settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTimings {
    /// Before every read of the review blocks.
    pub poll: Duration,
    /// After scrolling the reviews into view on the first page.
    pub lazy_load: Duration,
    /// After triggering the next page. Longer than `poll` because the whole
    /// review list gets replaced.
    pub page: Duration,
}

impl Default for SettleTimings {
    fn default() -> Self {
        Self {
            poll: Duration::from_millis(1500),
            lazy_load: Duration::from_millis(1500),
            page: Duration::from_millis(3000),
        }
    }
}

impl SettleTimings {
    pub fn zero() -> Self {
        Self {
            poll: Duration::ZERO,
            lazy_load: Duration::ZERO,
            page: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Polling,
    Extracting,
    Advancing,
    Done,
    AbortedDuplicate,
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverState::Done | DriverState::AbortedDuplicate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverState::Polling => "polling",
            DriverState::Extracting => "extracting",
            DriverState::Advancing => "advancing",
            DriverState::Done => "done",
            DriverState::AbortedDuplicate => "aborted_duplicate",
        }
    }
}

/// Result of walking one company's review pages.
#[derive(Debug, Clone)]
pub struct DriverOutcome {
    pub records: Vec<ReviewRecord>,
    pub terminal_state: DriverState,
    pub pages_scraped: u32,
}

/// Working state of a single driver run. Never outlives the run.
struct ScrapeSession {
    records: Vec<ReviewRecord>,
    seen: HashSet<Fingerprint>,
    page: u32,
    bound: u32,
    pages_scraped: u32,
}

impl ScrapeSession {
    fn new(bound: u32) -> Self {
        Self {
            records: Vec::new(),
            seen: HashSet::new(),
            page: 1,
            bound,
            pages_scraped: 0,
        }
    }

    fn finish(self, terminal_state: DriverState) -> DriverOutcome {
        DriverOutcome {
            records: self.records,
            terminal_state,
            pages_scraped: self.pages_scraped,
        }
    }
}

/// Page bound from the "last page" control. Leading digits are honoured the
/// way the site's own markup is read; anything else falls back to 1.
pub fn parse_page_bound(hint: Option<&str>) -> u32 {
    hint.map(str::trim)
        .map(|raw| {
            raw.chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(1)
}

/// Walks a profile's paginated reviews until the pagination runs out or a
/// page repeats.
pub struct PaginationDriver {
    fingerprinter: Arc<dyn ContentFingerprinter>,
    extractor: ReviewExtractor,
    timings: SettleTimings,
}

impl PaginationDriver {
    pub fn new() -> Self {
        Self {
            fingerprinter: Arc::new(Base64Fingerprinter),
            extractor: ReviewExtractor::new(),
            timings: SettleTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: SettleTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn ContentFingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    pub async fn run<P>(&self, page: &mut P) -> DriverOutcome
    where
        P: ReviewPage + ?Sized,
    {
        let bound = parse_page_bound(page.last_page_hint().as_deref());
        info!("Total review pages: {}", bound);

        let mut session = ScrapeSession::new(bound);
        let mut blocks: Vec<ReviewBlock> = Vec::new();
        let mut state = DriverState::Polling;

        while !state.is_terminal() {
            state = match state {
                DriverState::Polling => self.poll(page, &mut session, &mut blocks).await,
                DriverState::Extracting => {
                    info!("Scraping page {} of ~{}", session.page, session.bound);
                    let records = self.extractor.extract_page(&blocks);
                    session.records.extend(records);
                    session.pages_scraped += 1;
                    DriverState::Advancing
                }
                DriverState::Advancing => self.advance(page, &mut session).await,
                DriverState::Done | DriverState::AbortedDuplicate => state,
            };
        }

        info!(
            "Total reviews scraped: {} ({})",
            session.records.len(),
            state.as_str()
        );
        session.finish(state)
    }

    async fn poll<P>(
        &self,
        page: &mut P,
        session: &mut ScrapeSession,
        blocks: &mut Vec<ReviewBlock>,
    ) -> DriverState
    where
        P: ReviewPage + ?Sized,
    {
        tokio::time::sleep(self.timings.poll).await;

        *blocks = page.review_blocks();
        let fingerprint = self.fingerprinter.fingerprint_page(blocks);
        if !session.seen.insert(fingerprint) {
            warn!(
                "Duplicate page detected on page {} of {}, stopping",
                session.page,
                page.url()
            );
            return DriverState::AbortedDuplicate;
        }

        if session.page == 1 {
            if let Err(e) = page.scroll_reviews_into_view().await {
                debug!("Could not scroll reviews into view: {}", e);
            }
            tokio::time::sleep(self.timings.lazy_load).await;
            *blocks = page.review_blocks();
        }

        DriverState::Extracting
    }

    async fn advance<P>(&self, page: &mut P, session: &mut ScrapeSession) -> DriverState
    where
        P: ReviewPage + ?Sized,
    {
        let next_enabled = matches!(page.next_control(), Some(NextControl { enabled: true }));
        if !next_enabled || session.page >= session.bound {
            info!("No more pages to scrape");
            return DriverState::Done;
        }

        session.page += 1;
        if let Err(e) = page.click_next().await {
            warn!("Next page trigger failed on {}: {}", page.url(), e);
            return DriverState::Done;
        }
        tokio::time::sleep(self.timings.page).await;
        DriverState::Polling
    }
}

impl Default for PaginationDriver {
    fn default() -> Self {
        Self::new()
    }
}
