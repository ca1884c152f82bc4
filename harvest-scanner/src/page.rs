use crate::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One rendered review on a profile page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewBlock {
    /// Visible text of the whole block.
    pub text: String,
    /// Text of the reviewer metadata section, when the block has one.
    pub reviewer: Option<String>,
}

impl ReviewBlock {
    pub fn new(text: impl Into<String>, reviewer: Option<String>) -> Self {
        Self {
            text: text.into(),
            reviewer,
        }
    }
}

/// State of the "next page" pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextControl {
    pub enabled: bool,
}

/// Query and interaction surface of the page currently loaded in the host.
///
/// Reads reflect whatever is rendered at call time. `click_next` changes the
/// content in place; moving to another company is a full navigation and is
/// not part of this trait.
#[async_trait]
pub trait ReviewPage: Send {
    fn url(&self) -> &str;

    /// Absolute URLs of company profiles listed on a directory page.
    fn profile_links(&self) -> Vec<String>;

    /// Display name of the company a profile page belongs to.
    fn company_name(&self) -> Option<String>;

    fn review_blocks(&self) -> Vec<ReviewBlock>;

    /// Raw page-number attribute of the "last page" control.
    fn last_page_hint(&self) -> Option<String>;

    fn next_control(&self) -> Option<NextControl>;

    async fn scroll_reviews_into_view(&mut self) -> Result<()>;

    async fn click_next(&mut self) -> Result<()>;

    fn is_directory(&self) -> bool {
        !self.profile_links().is_empty()
    }
}

/// CSS selectors used to locate page elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub profile_link: String,
    pub review_container: String,
    pub review_block: String,
    pub reviewer: String,
    pub last_page: String,
    pub last_page_attribute: String,
    pub next_page: String,
    pub company_name: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            profile_link: "a.provider__cta-link.directory_profile".to_string(),
            review_container: "#reviews-sg-accordion".to_string(),
            review_block: r#"#reviews-sg-accordion [id^="review-"]"#.to_string(),
            reviewer: ".profile-review__reviewer.mobile_hide".to_string(),
            last_page: ".sg-pagination__link--icon-last".to_string(),
            last_page_attribute: "data-page".to_string(),
            next_page: ".sg-pagination__link--icon-next".to_string(),
            company_name: "h1".to_string(),
        }
    }
}

/// [`Selectors`] parsed once and shared between page loads.
#[derive(Debug)]
pub struct PageSelectors {
    profile_link: Selector,
    review_container: Selector,
    review_block: Selector,
    reviewer: Selector,
    last_page: Selector,
    last_page_attribute: String,
    next_page: Selector,
    company_name: Selector,
}

impl PageSelectors {
    pub fn compile(selectors: &Selectors) -> Result<Self> {
        Ok(Self {
            profile_link: parse_selector(&selectors.profile_link)?,
            review_container: parse_selector(&selectors.review_container)?,
            review_block: parse_selector(&selectors.review_block)?,
            reviewer: parse_selector(&selectors.reviewer)?,
            last_page: parse_selector(&selectors.last_page)?,
            last_page_attribute: selectors.last_page_attribute.clone(),
            next_page: parse_selector(&selectors.next_page)?,
            company_name: parse_selector(&selectors.company_name)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScanError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("harvest/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(timeout / 2)
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;
    Ok(client)
}

/// A fetched HTML document standing in for the host page.
///
/// The body is kept as text and parsed per query so the page stays `Send`
/// across the driver's awaits.
pub struct HtmlPage {
    client: Client,
    url: Url,
    body: String,
    selectors: Arc<PageSelectors>,
}

impl HtmlPage {
    pub async fn load(client: &Client, url: &str, selectors: Arc<PageSelectors>) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        let body = fetch(client, &url).await?;
        Ok(Self {
            client: client.clone(),
            url,
            body,
            selectors,
        })
    }

    pub fn from_html(
        client: &Client,
        url: &str,
        body: impl Into<String>,
        selectors: Arc<PageSelectors>,
    ) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self {
            client: client.clone(),
            url,
            body: body.into(),
            selectors,
        })
    }

    fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }

    fn next_href(&self) -> Option<String> {
        let document = self.document();
        document
            .select(&self.selectors.next_page)
            .next()
            .filter(|element| control_enabled(element))
            .and_then(|element| element.value().attr("href"))
            .map(str::to_string)
    }
}

async fn fetch(client: &Client, url: &Url) -> Result<String> {
    debug!("Fetching {}", url);
    let response = client.get(url.as_str()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScanError::UnexpectedStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

// Elements that start and end a rendered line.
const BLOCK_TAGS: [&str; 27] = [
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main",
    "nav", "ol", "p", "section", "tr", "ul",
];

const HIDDEN_TAGS: [&str; 4] = ["script", "style", "template", "noscript"];

/// Rendered text approximating a browser's `innerText`. Block elements and
/// `<br>` break lines; whitespace inside a line collapses to one space.
fn element_text(element: &ElementRef) -> String {
    let mut lines = Vec::new();
    let mut line = String::new();
    collect_lines(*element, &mut line, &mut lines);
    flush_line(&mut line, &mut lines);
    lines.join("\n")
}

fn collect_lines(element: ElementRef, line: &mut String, lines: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            line.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };

        let name = child.value().name();
        if name == "br" {
            flush_line(line, lines);
        } else if HIDDEN_TAGS.contains(&name) {
            continue;
        } else if BLOCK_TAGS.contains(&name) {
            flush_line(line, lines);
            collect_lines(child, line, lines);
            flush_line(line, lines);
        } else {
            collect_lines(child, line, lines);
        }
    }
}

fn flush_line(line: &mut String, lines: &mut Vec<String>) {
    let collapsed = collapse_whitespace(line);
    if !collapsed.is_empty() {
        lines.push(collapsed);
    }
    line.clear();
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn control_enabled(element: &ElementRef) -> bool {
    let value = element.value();
    let class_disabled = value.classes().any(|class| class.contains("disabled"));
    let aria_disabled = value
        .attr("aria-disabled")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    value.attr("disabled").is_none()
        && !class_disabled
        && !aria_disabled
        && value.attr("href").is_some()
}

#[async_trait]
impl ReviewPage for HtmlPage {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    fn profile_links(&self) -> Vec<String> {
        let document = self.document();
        document
            .select(&self.selectors.profile_link)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| self.url.join(href).ok())
            .map(|url| url.to_string())
            .collect()
    }

    fn company_name(&self) -> Option<String> {
        let document = self.document();
        document
            .select(&self.selectors.company_name)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .filter(|name| !name.is_empty())
    }

    fn review_blocks(&self) -> Vec<ReviewBlock> {
        let document = self.document();
        document
            .select(&self.selectors.review_block)
            .map(|block| {
                let reviewer = block
                    .select(&self.selectors.reviewer)
                    .next()
                    .map(|section| element_text(&section));
                ReviewBlock::new(element_text(&block), reviewer)
            })
            .collect()
    }

    fn last_page_hint(&self) -> Option<String> {
        let document = self.document();
        document
            .select(&self.selectors.last_page)
            .next()
            .and_then(|element| element.value().attr(&self.selectors.last_page_attribute))
            .map(str::to_string)
    }

    fn next_control(&self) -> Option<NextControl> {
        let document = self.document();
        document
            .select(&self.selectors.next_page)
            .next()
            .map(|element| NextControl {
                enabled: control_enabled(&element),
            })
    }

    async fn scroll_reviews_into_view(&mut self) -> Result<()> {
        // A fetched document has no lazy content to trigger.
        let present = self
            .document()
            .select(&self.selectors.review_container)
            .next()
            .is_some();
        debug!("Review container present on {}: {}", self.url, present);
        Ok(())
    }

    async fn click_next(&mut self) -> Result<()> {
        let href = self.next_href().ok_or(ScanError::NoNextControl)?;
        let next = self
            .url
            .join(&href)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", href, e)))?;
        self.body = fetch(&self.client, &next).await?;
        self.url = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    const BASE: &str = "https://reviews.example.com/profile/acme";

    fn selectors() -> Arc<PageSelectors> {
        Arc::new(PageSelectors::compile(&Selectors::default()).unwrap())
    }

    fn client() -> Client {
        build_client(Duration::from_secs(5)).unwrap()
    }

    fn review_html(id: usize, reviewer: &str) -> String {
        format!(
            r#"<div id="review-{id}">
                <div class="profile-review__reviewer mobile_hide">{reviewer}</div>
                <p>Review body {id}</p>
            </div>"#
        )
    }

    fn profile_html(reviews: &[String], pagination: &str) -> String {
        format!(
            r#"<html><body>
                <h1> Acme / Partners </h1>
                <div id="reviews-sg-accordion">{}</div>
                <nav>{}</nav>
            </body></html>"#,
            reviews.join("\n"),
            pagination
        )
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let custom = Selectors {
            review_block: "[[[".to_string(),
            ..Selectors::default()
        };
        let err = PageSelectors::compile(&custom).unwrap_err();
        assert!(matches!(err, ScanError::InvalidSelector { .. }));
    }

    #[test]
    fn test_directory_links_are_absolute() {
        let html = r#"<html><body>
            <a class="provider__cta-link directory_profile" href="/profile/one">One</a>
            <a class="provider__cta-link directory_profile" href="https://other.example.com/profile/two">Two</a>
            <a class="provider__cta-link" href="/not-a-profile">Nope</a>
        </body></html>"#;
        let page =
            HtmlPage::from_html(&client(), "https://reviews.example.com/directory", html, selectors())
                .unwrap();

        assert!(page.is_directory());
        assert_eq!(
            page.profile_links(),
            vec![
                "https://reviews.example.com/profile/one".to_string(),
                "https://other.example.com/profile/two".to_string(),
            ]
        );
    }

    #[test]
    fn test_profile_queries() {
        let html = profile_html(
            &[
                review_html(1, "<div>Jane Doe</div><div>CTO, Acme</div>"),
                review_html(2, "<span>Bob</span>"),
            ],
            r#"<a class="sg-pagination__link--icon-last" data-page="4" href="?page=4">Last</a>
               <a class="sg-pagination__link--icon-next" href="?page=2">Next</a>"#,
        );
        let page = HtmlPage::from_html(&client(), BASE, html, selectors()).unwrap();

        assert!(!page.is_directory());
        assert_eq!(page.company_name().as_deref(), Some("Acme / Partners"));
        assert_eq!(page.last_page_hint().as_deref(), Some("4"));
        assert_eq!(page.next_control(), Some(NextControl { enabled: true }));

        let blocks = page.review_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].reviewer.as_deref(), Some("Jane Doe\nCTO, Acme"));
        assert!(blocks[0].text.contains("Review body 1"));
    }

    #[test]
    fn test_inline_markup_stays_on_one_line() {
        let reviewer = r#"<div>Jane <b>Doe</b></div>
            <div>CTO, <a href="/acme">Acme</a></div>
            <div>Verified</div>
            <div><span class="icon"></span> Berlin, Germany</div>
            <div>51-200 Employees</div>
            <div>Online Review</div>"#;
        let html = profile_html(&[review_html(1, reviewer)], "");
        let page = HtmlPage::from_html(&client(), BASE, html, selectors()).unwrap();

        let blocks = page.review_blocks();
        let record = crate::ReviewExtractor::new()
            .extract_block(&blocks[0])
            .unwrap();
        assert_eq!(record.reviewer_name, "Jane Doe");
        assert_eq!(record.reviewer_company, "CTO, Acme");
        assert_eq!(record.reviewer_location, "Berlin, Germany");
        assert_eq!(record.reviewer_company_size, "51-200 Employees");
        assert_eq!(record.review_type, "Online Review");
    }

    #[test]
    fn test_wrapped_text_and_line_breaks() {
        let reviewer = "<p>Jane\n                Doe</p><span>CTO,</span> <span>Acme</span><br>Verified";
        let html = profile_html(&[review_html(1, reviewer)], "");
        let page = HtmlPage::from_html(&client(), BASE, html, selectors()).unwrap();

        let blocks = page.review_blocks();
        assert_eq!(
            blocks[0].reviewer.as_deref(),
            Some("Jane Doe\nCTO, Acme\nVerified")
        );
    }

    #[test]
    fn test_hidden_elements_are_not_rendered() {
        let reviewer = "<div>Jane</div><script>var x = 1;</script><style>.a{}</style><div>Acme</div>";
        let html = profile_html(&[review_html(1, reviewer)], "");
        let page = HtmlPage::from_html(&client(), BASE, html, selectors()).unwrap();

        assert_eq!(page.review_blocks()[0].reviewer.as_deref(), Some("Jane\nAcme"));
    }

    #[test]
    fn test_company_name_collapses_whitespace() {
        let html = r#"<html><body>
            <h1>
                Acme
                <span>Digital</span>   Agency
            </h1>
        </body></html>"#;
        let page = HtmlPage::from_html(&client(), BASE, html, selectors()).unwrap();

        assert_eq!(page.company_name().as_deref(), Some("Acme Digital Agency"));
    }

    #[test]
    fn test_disabled_next_control() {
        let html = profile_html(
            &[review_html(1, "Jane")],
            r#"<a class="sg-pagination__link--icon-next sg-pagination__link--disabled">Next</a>"#,
        );
        let page = HtmlPage::from_html(&client(), BASE, html, selectors()).unwrap();

        assert_eq!(page.next_control(), Some(NextControl { enabled: false }));
        assert_eq!(page.last_page_hint(), None);
    }

    #[test]
    fn test_block_without_reviewer_section() {
        let html = profile_html(
            &[r#"<div id="review-9"><p>Just text</p></div>"#.to_string()],
            "",
        );
        let page = HtmlPage::from_html(&client(), BASE, html, selectors()).unwrap();

        let blocks = page.review_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].reviewer, None);
        assert_eq!(page.next_control(), None);
    }

    #[tokio::test]
    async fn test_click_next_replaces_document() {
        let mock_server = MockServer::start().await;

        let page_two = profile_html(&[review_html(3, "Carol")], "");
        Mock::given(method("GET"))
            .and(path("/profile/acme"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(page_two.as_bytes()),
            )
            .mount(&mock_server)
            .await;

        let page_one = profile_html(
            &[review_html(1, "Jane")],
            r#"<a class="sg-pagination__link--icon-next" href="?page=2">Next</a>"#,
        );
        let start = format!("{}/profile/acme", mock_server.uri());
        let mut page = HtmlPage::from_html(&client(), &start, page_one, selectors()).unwrap();

        page.click_next().await.unwrap();

        assert!(page.url().ends_with("/profile/acme?page=2"));
        let blocks = page.review_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].reviewer.as_deref(), Some("Carol"));
    }

    #[tokio::test]
    async fn test_click_next_without_control_fails() {
        let html = profile_html(&[review_html(1, "Jane")], "");
        let mut page = HtmlPage::from_html(&client(), BASE, html, selectors()).unwrap();

        let err = page.click_next().await.unwrap_err();
        assert!(matches!(err, ScanError::NoNextControl));
    }

    #[tokio::test]
    async fn test_load_rejects_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/missing", mock_server.uri());
        let result = HtmlPage::load(&client(), &url, selectors()).await;

        assert!(matches!(
            result,
            Err(ScanError::UnexpectedStatus { status: 404, .. })
        ));
    }
}
