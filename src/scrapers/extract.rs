use crate::models::ListingRecord;
use crate::query::{page_url, sanitize_link};
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::ListingSelectors;
use anyhow::Result;
use reqwest::Url;
use scraper::{ElementRef, Html};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pull listing records out of a result container, in document order.
///
/// Links are resolved against `page_url`. Cards missing a link, address or
/// price are skipped.
pub fn parse_listings(
    container_html: &str,
    page_url: &str,
    selectors: &ListingSelectors,
) -> Vec<ListingRecord> {
    let base = match Url::parse(page_url) {
        Ok(base) => Some(base),
        Err(e) => {
            warn!("Cannot resolve links against {}: {}", page_url, e);
            None
        }
    };
    let fragment = Html::parse_fragment(container_html);
    let mut records = Vec::new();

    for (idx, item) in fragment.select(&selectors.item).enumerate() {
        match parse_card(item, base.as_ref(), selectors) {
            Some(record) => records.push(record),
            None => debug!("Skipped card {}: missing link, address or price", idx),
        }
    }

    records
}

fn parse_card(
    item: ElementRef<'_>,
    base: Option<&Url>,
    selectors: &ListingSelectors,
) -> Option<ListingRecord> {
    let href = item.select(&selectors.link).next()?.value().attr("href")?;
    if sanitize_link(href).is_empty() {
        return None;
    }
    // Keys are always absolute, as the browser reports them
    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    }
    .to_string();
    let link = sanitize_link(&resolved);

    let address = selectors
        .address
        .iter()
        .find_map(|selector| item.select(selector).next())?;
    let price = item.select(&selectors.price).next()?;

    Some(ListingRecord {
        link: link.to_string(),
        address: element_text(address),
        price: element_text(price),
    })
}

/// Visible text with runs of whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Walks the result pages of one search, one page per call.
///
/// Stops after `max_pages` pages, or at the first page whose container can't
/// be loaded. Once finished it keeps returning `None`.
pub struct ResultPages<'a> {
    fetcher: &'a dyn PageFetcher,
    selectors: &'a ListingSelectors,
    url: String,
    max_pages: Option<u32>,
    page_delay: Duration,
    next_page: u32,
    finished: bool,
}

impl<'a> ResultPages<'a> {
    /// `max_pages` of `None` keeps going until the site runs out of pages.
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        selectors: &'a ListingSelectors,
        url: impl Into<String>,
        max_pages: Option<u32>,
    ) -> Self {
        Self {
            fetcher,
            selectors,
            url: url.into(),
            max_pages,
            page_delay: Duration::ZERO,
            next_page: 1,
            finished: false,
        }
    }

    /// Pause before each page request
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Pages successfully loaded so far
    pub fn pages_loaded(&self) -> u32 {
        self.next_page - 1
    }

    /// Records from the next page, `Ok(None)` once the results are exhausted.
    ///
    /// Fetcher errors other than end-of-results are returned as fatal.
    pub async fn next_page(&mut self) -> Result<Option<Vec<ListingRecord>>> {
        if self.finished {
            return Ok(None);
        }
        if self.max_pages.is_some_and(|max| self.next_page > max) {
            self.finished = true;
            return Ok(None);
        }

        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }

        let url = page_url(&self.url, self.next_page);
        info!("Parsing url: [{}]", url);

        let container = match self.fetcher.fetch_container(&url).await {
            Ok(html) => html,
            Err(e) if e.is_end_of_results() => {
                if self.next_page == 1 {
                    warn!("No result pages loaded, first page failed: {}", e);
                } else {
                    info!("Reached end of results: {}", e);
                }
                self.finished = true;
                return Ok(None);
            }
            Err(e) => {
                self.finished = true;
                return Err(e.into());
            }
        };

        let records = parse_listings(&container, &url, self.selectors);
        debug!("Page {} yielded {} listings", self.next_page, records.len());
        self.next_page += 1;

        Ok(Some(records))
    }

    /// Drain every remaining page in order.
    pub async fn collect_all(&mut self) -> Result<Vec<ListingRecord>> {
        let mut all = Vec::new();
        while let Some(records) = self.next_page().await? {
            all.extend(records);
        }
        Ok(all)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves canned responses in order, then reports a missing container.
    pub(crate) struct ScriptedFetcher {
        responses: Mutex<Vec<Result<String, FetchError>>>,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub(crate) fn new(mut responses: Vec<Result<String, FetchError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requested: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn pages(pages: &[&str]) -> Self {
            Self::new(pages.iter().map(|p| Ok(p.to_string())).collect())
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_container(&self, page_url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(page_url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| {
                    Err(FetchError::ContainerMissing {
                        url: page_url.to_string(),
                        selector: ".searchCardList".to_string(),
                        reason: "timed out".to_string(),
                    })
                })
        }

        fn engine_name(&self) -> &'static str {
            "scripted"
        }
    }

    pub(crate) fn card(href: &str, address: &str, price: &str) -> String {
        format!(
            r#"<li class="searchCardList--listItem">
                <div class="listingCard">
                  <a class="listingCard-globalLink" href="{href}"></a>
                  <p class="listingCard-addressLabel">{address}</p>
                  <span class="price listingCard-priceMargin">{price}</span>
                </div>
              </li>"#
        )
    }

    pub(crate) fn container(cards: &[String]) -> String {
        format!(r#"<ul class="searchCardList">{}</ul>"#, cards.concat())
    }

    const PAGE: &str = "https://streeteasy.com/for-rent/ues/?page=1";

    fn selectors() -> ListingSelectors {
        ListingSelectors::streeteasy().unwrap()
    }

    #[test]
    fn parses_cards_in_document_order() {
        let html = container(&[
            card("https://x/a?featured=1", "1 First Ave", "$1,500"),
            card("https://x/b", "2 Second Ave", "$2,500"),
        ]);

        let records = parse_listings(&html, PAGE, &selectors());
        assert_eq!(
            records,
            vec![
                ListingRecord {
                    link: "https://x/a".to_string(),
                    address: "1 First Ave".to_string(),
                    price: "$1,500".to_string(),
                },
                ListingRecord {
                    link: "https://x/b".to_string(),
                    address: "2 Second Ave".to_string(),
                    price: "$2,500".to_string(),
                },
            ]
        );
    }

    #[test]
    fn skips_malformed_cards_only() {
        let html = container(&[
            r#"<li><a class="listingCard-globalLink" href="https://x/no-price"></a>
               <p class="listingCard-addressLabel">3 Third Ave</p></li>"#
                .to_string(),
            r#"<li class="ad">Sponsored</li>"#.to_string(),
            card("https://x/ok", "4 Fourth Ave", "$4,000"),
        ]);

        let records = parse_listings(&html, PAGE, &selectors());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://x/ok");
    }

    #[test]
    fn relative_links_resolve_against_page() {
        let html = container(&[
            card("/building/foo/2b?featured=1", "2 Foo St", "$2,200"),
            card("query", "Odd card", "$1"),
        ]);

        let records = parse_listings(&html, PAGE, &selectors());
        assert_eq!(records[0].link, "https://streeteasy.com/building/foo/2b");
        assert_eq!(records[1].link, "https://streeteasy.com/for-rent/ues/query");
    }

    #[test]
    fn relative_links_dropped_without_base() {
        let html = container(&[
            card("/building/foo/2b", "2 Foo St", "$2,200"),
            card("https://x/abs?ref=1", "1 Abs St", "$1"),
        ]);

        let records = parse_listings(&html, "not a url", &selectors());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://x/abs");
    }

    #[test]
    fn falls_back_to_title_text() {
        let html = container(&[r#"<li>
              <a class="listingCard-globalLink" href="https://x/c"></a>
              <p class="listingCard-title">Rental unit in
                 Upper East Side</p>
              <span class="price">$2,100</span></li>"#
            .to_string()]);

        let records = parse_listings(&html, PAGE, &selectors());
        assert_eq!(records[0].address, "Rental unit in Upper East Side");
    }

    #[tokio::test]
    async fn stops_at_page_limit() {
        let page = container(&[card("https://x/a", "1 First Ave", "$1")]);
        let fetcher = ScriptedFetcher::pages(&[&page, &page, &page]);
        let selectors = selectors();

        let mut pages = ResultPages::new(&fetcher, &selectors, "https://s/for-rent/ues", Some(2));
        let records = pages.collect_all().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(pages.pages_loaded(), 2);
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec![
                "https://s/for-rent/ues/?page=1".to_string(),
                "https://s/for-rent/ues/?page=2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_container_ends_cleanly() {
        let page = container(&[card("https://x/a", "1 First Ave", "$1")]);
        let fetcher = ScriptedFetcher::pages(&[&page]);
        let selectors = selectors();

        let mut pages = ResultPages::new(&fetcher, &selectors, "https://s/q", Some(5));
        assert_eq!(pages.next_page().await.unwrap().unwrap().len(), 1);
        assert!(pages.next_page().await.unwrap().is_none());
        assert!(pages.next_page().await.unwrap().is_none());
        assert_eq!(fetcher.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unbounded_runs_until_navigation_fails() {
        let page = container(&[card("https://x/a", "1 First Ave", "$1")]);
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page.clone()),
            Ok(page.clone()),
            Ok(page),
            Err(FetchError::Navigation {
                url: "https://s/q/?page=4".to_string(),
                reason: "net::ERR_ABORTED".to_string(),
            }),
        ]);
        let selectors = selectors();

        let mut pages = ResultPages::new(&fetcher, &selectors, "https://s/q", None);
        assert_eq!(pages.collect_all().await.unwrap().len(), 3);
        assert_eq!(pages.pages_loaded(), 3);
    }

    #[tokio::test]
    async fn malformed_page_does_not_stop_later_pages() {
        let broken = container(&[r#"<li><p class="listingCard-addressLabel">No link</p></li>"#
            .to_string()]);
        let good = container(&[card("https://x/later", "9 Later St", "$900")]);
        let fetcher = ScriptedFetcher::pages(&[&broken, &good]);
        let selectors = selectors();

        let mut pages = ResultPages::new(&fetcher, &selectors, "https://s/q", Some(2));
        assert!(pages.next_page().await.unwrap().unwrap().is_empty());
        let second = pages.next_page().await.unwrap().unwrap();

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].link, "https://x/later");
        assert_eq!(pages.pages_loaded(), 2);
    }

    #[tokio::test]
    async fn first_page_failure_loads_nothing() {
        let fetcher = ScriptedFetcher::new(vec![Err(FetchError::Navigation {
            url: "https://s/q/?page=1".to_string(),
            reason: "status 403 Forbidden".to_string(),
        })]);
        let selectors = selectors();

        let mut pages = ResultPages::new(&fetcher, &selectors, "https://s/q", Some(3));
        assert!(pages.collect_all().await.unwrap().is_empty());
        assert_eq!(pages.pages_loaded(), 0);
        assert_eq!(fetcher.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unavailable_fetcher_is_fatal() {
        let fetcher = ScriptedFetcher::new(vec![Err(FetchError::Unavailable(
            "browser connection closed".to_string(),
        ))]);
        let selectors = selectors();

        let mut pages = ResultPages::new(&fetcher, &selectors, "https://s/q", Some(1));
        let err = pages.collect_all().await.unwrap_err();
        assert!(err.to_string().contains("browser connection closed"));
    }

    #[tokio::test]
    async fn empty_page_still_advances() {
        let fetcher = ScriptedFetcher::pages(&[&container(&[]), &container(&[])]);
        let selectors = selectors();

        let mut pages = ResultPages::new(&fetcher, &selectors, "https://s/q", Some(2));
        assert!(pages.collect_all().await.unwrap().is_empty());
        assert_eq!(fetcher.requested.lock().unwrap().len(), 2);
    }
}
