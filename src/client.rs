use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, ORIGIN, REFERER,
    USER_AGENT,
};
use reqwest::RequestBuilder;
use tracing::debug;

use crate::crawler::{PageRequest, PageSource};
use crate::error::FetchError;
use crate::parser::record::SearchResponse;

pub const SEARCH_URL: &str = "https://www.asc.ca/coveo/rest/search/v2\
?sitecoreItemUri=sitecore%3A%2F%2Fweb%2F%7B4914B9E4-A101-438A-A8DF-C04C42874916%7D%3Flang%3Den%26ver%3D2\
&siteName=asc";

const SITE_ORIGIN: &str = "https://www.asc.ca";
const SITE_REFERER: &str = "https://www.asc.ca/en/enforcement/notices-decisions-and-orders";

/// Analytics cookies a browser visit to the search page leaves behind.
const SITE_COOKIES: &str = "_gcl_au=1.1.1734506661.1729499227; \
_ga=GA1.1.1717590813.1729499227; \
_fbp=fb.1.1729499227312.179531952380438286; \
_ga_L2NZ0358YT=GS1.1.1729499227.1.1.1729501235.48.0.0; \
_ga_MP2P11677J=GS1.1.1729499227.1.1.1729501235.0.0.0";

/// Adds transport-level details (headers, identity) to an outgoing page request.
pub trait RequestDecorator: Send + Sync {
    fn decorate(&self, request: RequestBuilder) -> RequestBuilder;
}

struct BrowserProfile {
    user_agent: &'static str,
    client_hints: Option<(&'static str, &'static str)>,
}

const BROWSER_PROFILES: &[BrowserProfile] = &[
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
        client_hints: Some((
            "\"Google Chrome\";v=\"129\", \"Not=A?Brand\";v=\"8\", \"Chromium\";v=\"129\"",
            "\"Windows\"",
        )),
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36 Edg/129.0.0.0",
        client_hints: Some((
            "\"Microsoft Edge\";v=\"129\", \"Not=A?Brand\";v=\"8\", \"Chromium\";v=\"129\"",
            "\"Windows\"",
        )),
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
                     (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
        client_hints: None,
    },
];

/// Rotates through a fixed set of desktop browser header profiles, one per request.
#[derive(Default)]
pub struct BrowserHeaders {
    next: AtomicUsize,
}

impl BrowserHeaders {
    pub fn next_headers(&self) -> HeaderMap {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % BROWSER_PROFILES.len();
        let profile = &BROWSER_PROFILES[i];

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(profile.user_agent));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static(SITE_REFERER));
        headers.insert(COOKIE, HeaderValue::from_static(SITE_COOKIES));
        if let Some((brands, platform)) = profile.client_hints {
            headers.insert(HeaderName::from_static("sec-ch-ua"), HeaderValue::from_static(brands));
            headers.insert(
                HeaderName::from_static("sec-ch-ua-platform"),
                HeaderValue::from_static(platform),
            );
            headers.insert(
                HeaderName::from_static("sec-ch-ua-mobile"),
                HeaderValue::from_static("?0"),
            );
        }
        headers
    }
}

impl RequestDecorator for BrowserHeaders {
    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        request.headers(self.next_headers())
    }
}

/// Live search API over HTTPS.
pub struct HttpPageSource<D = BrowserHeaders> {
    client: reqwest::Client,
    decorator: D,
    url: String,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_decorator(SEARCH_URL, timeout, BrowserHeaders::default())
    }
}

impl<D: RequestDecorator> HttpPageSource<D> {
    pub fn with_decorator(url: &str, timeout: Duration, decorator: D) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            decorator,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl<D: RequestDecorator> PageSource for HttpPageSource<D> {
    async fn fetch(&self, request: &PageRequest) -> Result<SearchResponse, FetchError> {
        debug!(offset = request.offset, "POST {}", self.url);
        let builder = self.client.post(&self.url).form(&request.form);
        let resp = self.decorator.decorate(builder).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
