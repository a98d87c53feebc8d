//! Session-aware HTTP transport feeding the extraction passes.

use std::sync::Arc;
use std::time::Duration;

use faweb_extract::Walker;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use scraper::Html;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::handlers::MyUsername;
use crate::limiter::RequestGate;

/// How much of a failed response body is kept for diagnostics.
const BODY_SNIPPET_LEN: usize = 512;

/// HTTP client for the site: one connection pool, one cookie jar, one
/// rate-limiting gate. All domain operations and lazy record fetches go
/// through an instance of this; independent sessions are independent
/// instances, never process globals.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    config: Config,
    gate: RequestGate,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let base = config
            .base_url
            .parse::<reqwest::Url>()
            .map_err(|e| Error::Config(format!("bad base URL {:?}: {e}", config.base_url)))?;

        let jar = Arc::new(reqwest::cookie::Jar::default());
        for cookie in &config.cookies {
            jar.add_cookie_str(&format!("{}={}", cookie.name, cookie.value), &base);
        }

        let mut builder = reqwest::ClientBuilder::new()
            .user_agent(&config.user_agent)
            .cookie_provider(jar)
            .timeout(Duration::from_secs_f32(config.request_timeout))
            .gzip(true)
            .deflate(true);
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("bad proxy URL {proxy:?}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let gate = RequestGate::new(Duration::from_secs_f32(config.min_request_interval));

        Ok(Self { http, config, gate })
    }

    /// Absolute URLs pass through verbatim; site paths get the configured
    /// base prefixed.
    pub(crate) fn url(&self, path: &str) -> String {
        if path.starts_with("https://") || path.starts_with("http://") {
            path.to_string()
        } else {
            format!("{}{path}", self.config.base_url.trim_end_matches('/'))
        }
    }

    /// Gate, send, classify. One-shot: a non-200 comes back as
    /// [`Error::Status`] with the body captured, and no retry happens
    /// here.
    async fn dispatch(&self, req: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response> {
        self.gate.wait().await;
        log::debug!("dispatching request for {url}");

        let resp = req.send().await.map_err(|e| Error::Http {
            url: url.to_string(),
            source: e,
        })?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = snippet(resp.text().await.unwrap_or_default());
            log::error!("unexpected HTTP status {status} for {url}");
            return Err(Error::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(resp)
    }

    /// Raw byte fetch for images and downloads; no content-type check.
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url(path);
        let resp = self.dispatch(self.http.get(&url), &url).await?;
        let bytes = resp.bytes().await.map_err(|e| Error::Http { url, source: e })?;
        Ok(bytes.to_vec())
    }

    pub async fn get_html(&self, path: &str) -> Result<Html> {
        let url = self.url(path);
        let resp = self.dispatch(self.http.get(&url), &url).await?;
        self.parse_html(resp, url).await
    }

    pub async fn post_html(&self, path: &str, form: &[(&str, &str)]) -> Result<Html> {
        let url = self.url(path);
        let resp = self.dispatch(self.http.post(&url).form(form), &url).await?;
        self.parse_html(resp, url).await
    }

    /// Only `text/html` responses reach the parser; anything else is a
    /// distinct failure kind, body captured.
    async fn parse_html(&self, resp: reqwest::Response, url: String) -> Result<Html> {
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("text/html") {
            let body = snippet(resp.text().await.unwrap_or_default());
            log::error!("unexpected content-type {content_type:?} for {url}");
            return Err(Error::ContentType {
                url,
                content_type,
                body,
            });
        }

        let text = resp.text().await.map_err(|e| Error::Http { url, source: e })?;
        Ok(Html::parse_document(&text))
    }

    /// Verifies that the configured cookies produce a logged-in session
    /// by finding our own username anchor. [`Error::NotLoggedIn`] means
    /// the request succeeded but the session is anonymous.
    pub async fn username(&self) -> Result<String> {
        let html = self.get_html("/search").await?;
        let mut me = MyUsername::default();
        Walker::new(vec![&mut me]).walk(html.tree.root());
        me.name.ok_or(Error::NotLoggedIn)
    }
}

fn snippet(mut body: String) -> String {
    if body.len() > BODY_SNIPPET_LEN {
        let mut end = BODY_SNIPPET_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
