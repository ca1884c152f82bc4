use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::export::{DownloadSink, Exporter, safe_company_name};
use crate::queue::{CompanyTarget, NavigationQueue};
use crate::store::KeyValueStore;
use async_trait::async_trait;
use harvest_scanner::page::build_client;
use harvest_scanner::{HtmlPage, PageSelectors, PaginationDriver, ReviewPage};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use harvest_scanner::DriverState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Directory,
    Profile,
}

/// What the caller must do once a page has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Load this target from scratch.
    Navigate(CompanyTarget),
    /// The last company was exported and the queue deleted.
    Finished,
    /// Nothing queued for this page.
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyExport {
    pub page_url: String,
    pub file_name: String,
    pub records: usize,
    pub terminal_state: DriverState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub kind: PageKind,
    pub export: Option<CompanyExport>,
    pub continuation: Continuation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub page_loads: usize,
    pub exports: Vec<CompanyExport>,
    pub finished: bool,
}

/// Callback for reporting traversal progress
pub type HarvestProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

pub fn classify<P: ReviewPage + ?Sized>(page: &P) -> PageKind {
    if page.is_directory() {
        PageKind::Directory
    } else {
        PageKind::Profile
    }
}

/// Handles a single page load.
///
/// Built fresh for every load; the only state it sees from earlier loads is
/// what the [`NavigationQueue`] reads back from the store.
pub struct Harvester<'a> {
    queue: NavigationQueue<'a>,
    sink: &'a dyn DownloadSink,
    driver: PaginationDriver,
    exporter: Exporter,
    navigate_settle: Duration,
}

impl<'a> Harvester<'a> {
    pub fn new(
        store: &'a dyn KeyValueStore,
        sink: &'a dyn DownloadSink,
        config: &HarvestConfig,
    ) -> Self {
        Self {
            queue: NavigationQueue::new(store),
            sink,
            driver: PaginationDriver::new()
                .with_timings(config.settle)
                .with_fingerprinter(config.fingerprint.build()),
            exporter: Exporter::new(config.header_layout),
            navigate_settle: config.navigate_settle,
        }
    }

    pub async fn handle_page<P>(&self, page: &mut P) -> Result<PageOutcome>
    where
        P: ReviewPage + ?Sized,
    {
        match classify(&*page) {
            PageKind::Directory => {
                info!("On directory page {}", page.url());
                let continuation = self.handle_directory(&*page)?;
                Ok(PageOutcome {
                    kind: PageKind::Directory,
                    export: None,
                    continuation,
                })
            }
            PageKind::Profile => {
                info!("On profile page {}", page.url());
                let (export, continuation) = self.handle_profile(page).await?;
                Ok(PageOutcome {
                    kind: PageKind::Profile,
                    export,
                    continuation,
                })
            }
        }
    }

    fn handle_directory<P>(&self, page: &P) -> Result<Continuation>
    where
        P: ReviewPage + ?Sized,
    {
        let targets = page
            .profile_links()
            .into_iter()
            .map(CompanyTarget::from)
            .collect();

        Ok(match self.queue.seed_from_directory(targets)? {
            Some(first) => Continuation::Navigate(first),
            None => Continuation::Idle,
        })
    }

    async fn handle_profile<P>(&self, page: &mut P) -> Result<(Option<CompanyExport>, Continuation)>
    where
        P: ReviewPage + ?Sized,
    {
        let snapshot = match self.queue.snapshot()? {
            Some(snapshot) if !snapshot.is_exhausted() => snapshot,
            _ => {
                info!("No company queue in progress");
                self.queue.clear()?;
                return Ok((None, Continuation::Idle));
            }
        };

        info!(
            "Visiting company {} of {}: {}",
            snapshot.cursor + 1,
            snapshot.targets.len(),
            page.url()
        );

        let outcome = self.driver.run(page).await;

        let safe_name = page
            .company_name()
            .map(|name| safe_company_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("company_{}", snapshot.cursor + 1));
        let file_name = self
            .exporter
            .export(&safe_name, &outcome.records, self.sink)?;

        let export = CompanyExport {
            page_url: page.url().to_string(),
            file_name,
            records: outcome.records.len(),
            terminal_state: outcome.terminal_state,
        };

        let continuation = match self.queue.advance()? {
            Some(next) => {
                info!("Moving to next profile");
                tokio::time::sleep(self.navigate_settle).await;
                Continuation::Navigate(next)
            }
            None => Continuation::Finished,
        };

        Ok((Some(export), continuation))
    }
}

/// Produces a freshly loaded page for a URL, standing in for a full
/// navigation in the host.
#[async_trait]
pub trait PageLoader {
    type Page: ReviewPage;

    async fn load(&self, url: &str) -> Result<Self::Page>;
}

pub struct HtmlLoader {
    client: Client,
    selectors: Arc<PageSelectors>,
}

impl HtmlLoader {
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            selectors: Arc::new(PageSelectors::compile(&config.selectors)?),
        })
    }
}

#[async_trait]
impl PageLoader for HtmlLoader {
    type Page = HtmlPage;

    async fn load(&self, url: &str) -> Result<HtmlPage> {
        Ok(HtmlPage::load(&self.client, url, self.selectors.clone()).await?)
    }
}

/// One page load: fetch `url`, handle it, and report where to go next.
pub async fn visit_once<L>(
    url: &str,
    loader: &L,
    store: &dyn KeyValueStore,
    sink: &dyn DownloadSink,
    config: &HarvestConfig,
) -> Result<PageOutcome>
where
    L: PageLoader + ?Sized,
{
    let mut page = loader.load(url).await?;
    Harvester::new(store, sink, config)
        .handle_page(&mut page)
        .await
}

/// Follow navigations from `start_url` until the traversal finishes or a
/// page has nothing queued.
pub async fn execute_harvest<L>(
    start_url: &str,
    loader: &L,
    store: &dyn KeyValueStore,
    sink: &dyn DownloadSink,
    config: &HarvestConfig,
    progress_callback: Option<HarvestProgressCallback>,
) -> Result<HarvestSummary>
where
    L: PageLoader + ?Sized,
{
    let mut summary = HarvestSummary::default();
    let mut url = start_url.to_string();

    loop {
        if summary.page_loads >= config.max_page_loads {
            return Err(HarvestError::PageLoadLimit(config.max_page_loads));
        }
        summary.page_loads += 1;

        if let Some(ref callback) = progress_callback {
            callback(format!("Loading {}", url));
        }

        let outcome = visit_once(&url, loader, store, sink, config).await?;

        if let Some(export) = outcome.export {
            if let Some(ref callback) = progress_callback {
                callback(format!(
                    "Saved {} reviews to {}",
                    export.records, export.file_name
                ));
            }
            summary.exports.push(export);
        }

        match outcome.continuation {
            Continuation::Navigate(target) => url = target.as_str().to_string(),
            Continuation::Finished => {
                summary.finished = true;
                break;
            }
            Continuation::Idle => break,
        }
    }

    Ok(summary)
}
