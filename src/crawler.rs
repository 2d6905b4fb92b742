use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::parser::extract::DateZone;
use crate::parser::process_page;
use crate::parser::record::SearchResponse;
use crate::table::Row;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Fixed part of the search query. Only `firstResult` and `numberOfResults` vary.
const QUERY_TEMPLATE: &[(&str, &str)] = &[
    ("referrer", ""),
    ("isGuestUser", "false"),
    (
        "aq",
        "NOT @z95xtemplate==(ADB6CA4F03EF4F47B9AC9CE2BA53FF97,FE5DD82648C6436DB87A7C4210C7413B)",
    ),
    (
        "cq",
        "(@z95xlanguage==en) (@z95xlatestversion==1) (@source==\"Coveo_public_index - ASC-PROD\")",
    ),
    ("searchHub", "Notices Decisions and Orders"),
    ("locale", "en"),
    ("pipeline", "noticesdecisionsordersenforcement"),
    ("maximumAge", "900000"),
    ("excerptLength", "200"),
    ("enableDidYouMean", "false"),
    ("sortCriteria", "@z95xcreateddate descending"),
    ("queryFunctions", "[]"),
    ("rankingFunctions", "[]"),
    ("facetOptions", "{}"),
    ("categoryFacets", "[]"),
    ("retrieveFirstSentences", "true"),
    ("timezone", "America/Edmonton"),
    ("enableQuerySyntax", "false"),
    ("enableDuplicateFiltering", "false"),
    ("enableCollaborativeRating", "false"),
    ("debug", "false"),
    ("allowQueriesWithoutKeywords", "true"),
];

/// Position in the result set. A new cursor is produced for every page; none is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlCursor {
    pub offset: u64,
    pub page_size: u64,
    /// Total reported by the most recent page; `None` before the first response.
    pub total_count: Option<u64>,
}

impl CrawlCursor {
    pub fn start(page_size: u64) -> Self {
        Self {
            offset: 0,
            page_size,
            total_count: None,
        }
    }

    /// Step one page forward against the latest total. `None` once the offset reaches it.
    pub fn advance(&self, total_count: u64) -> Option<Self> {
        let offset = self.offset + self.page_size;
        (offset < total_count).then_some(Self {
            offset,
            page_size: self.page_size,
            total_count: Some(total_count),
        })
    }
}

/// A ready-to-send page request: the form body for one offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub form: Vec<(&'static str, String)>,
}

pub fn build_request(cursor: &CrawlCursor) -> PageRequest {
    let mut form: Vec<(&'static str, String)> = QUERY_TEMPLATE
        .iter()
        .map(|&(k, v)| (k, v.to_string()))
        .collect();
    form.push(("firstResult", cursor.offset.to_string()));
    form.push(("numberOfResults", cursor.page_size.to_string()));
    PageRequest {
        offset: cursor.offset,
        form,
    }
}

/// Something that can answer a page request.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<SearchResponse, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// One attempt per page, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt)
    }
}

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub page_size: u64,
    pub retry: RetryPolicy,
    pub max_pages: Option<usize>,
    pub date_zone: DateZone,
    pub show_progress: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::none(),
            max_pages: None,
            date_zone: DateZone::default(),
            show_progress: false,
        }
    }
}

/// What a crawl produced. Rows gathered before a failure are always kept.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub rows: Vec<Row>,
    pub pages: usize,
    pub total_count: u64,
    /// The fetch error that stopped the crawl early, if any.
    pub aborted: Option<FetchError>,
}

impl CrawlOutcome {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

#[derive(Debug)]
pub enum Next {
    Page(CrawlCursor, PageRequest),
    Done,
}

/// Result of handling one received page.
#[derive(Debug)]
pub struct PageStep {
    pub rows: Vec<Row>,
    pub next: Next,
}

pub struct Crawler<S> {
    source: S,
    options: CrawlOptions,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(source: S, options: CrawlOptions) -> Self {
        Self { source, options }
    }

    pub fn start(&self) -> (CrawlCursor, PageRequest) {
        let cursor = CrawlCursor::start(self.options.page_size);
        let request = build_request(&cursor);
        (cursor, request)
    }

    /// Assemble the page's rows and decide whether another page is needed.
    pub fn on_page(&self, cursor: &CrawlCursor, page: &SearchResponse) -> PageStep {
        let rows = process_page(page, cursor, self.options.date_zone);
        let next = match cursor.advance(page.total_count) {
            Some(next) => {
                let request = build_request(&next);
                Next::Page(next, request)
            }
            None => Next::Done,
        };
        PageStep { rows, next }
    }

    /// Page through the whole result set, one request at a time.
    pub async fn run(&self) -> CrawlOutcome {
        let pb = self.progress_bar();
        let (mut cursor, mut request) = self.start();
        let mut outcome = CrawlOutcome {
            rows: Vec::new(),
            pages: 0,
            total_count: 0,
            aborted: None,
        };

        loop {
            let page = match self.fetch_with_retry(&request).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        "Crawl stopped at offset {} after {} pages: {}",
                        request.offset, outcome.pages, e
                    );
                    outcome.aborted = Some(e);
                    break;
                }
            };

            outcome.pages += 1;
            outcome.total_count = page.total_count;
            debug!(
                offset = cursor.offset,
                hits = page.results.len(),
                total = page.total_count,
                "Received page"
            );

            let step = self.on_page(&cursor, &page);
            outcome.rows.extend(step.rows);
            pb.set_length(page.total_count.div_ceil(self.options.page_size.max(1)));
            pb.inc(1);

            match step.next {
                Next::Page(next, next_request) => {
                    if self.options.max_pages.is_some_and(|max| outcome.pages >= max) {
                        info!("Page limit reached at {} pages", outcome.pages);
                        break;
                    }
                    cursor = next;
                    request = next_request;
                }
                Next::Done => break,
            }
        }

        pb.finish_and_clear();
        info!(
            "Crawled {} pages, {} rows (server total {})",
            outcome.pages,
            outcome.rows.len(),
            outcome.total_count
        );
        outcome
    }

    async fn fetch_with_retry(&self, request: &PageRequest) -> Result<SearchResponse, FetchError> {
        let retry = self.options.retry;
        let mut attempt = 0;
        loop {
            match self.source.fetch(request).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                    let backoff = retry.backoff(attempt);
                    warn!(
                        "Page at offset {} failed (attempt {}/{}), retrying in {:.1}s: {}",
                        request.offset,
                        attempt + 1,
                        retry.max_retries + 1,
                        backoff.as_secs_f64(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} pages ({per_sec})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    }
}
