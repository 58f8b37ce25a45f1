//! Test utilities shared by the dualcrawl integration tests

use anyhow::{Result, anyhow};
use dualcrawl::config::{CrawlConfig, Credentials};
use dualcrawl::crawl_engine::LanguageProbe;
use dualcrawl::render::{
    PageRenderer, RenderFailure, RenderRequest, RenderResult, TimingMetrics,
};
use dualcrawl::ThrottleConfig;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// A page as served by the fake renderer
#[derive(Clone)]
pub enum FakePage {
    Html { status: u16, body: String },
    Timeout,
}

/// In-memory renderer: answers from a URL map and records every request.
///
/// Unknown URLs render as a 404 page with an empty body.
#[derive(Default)]
pub struct FakeRenderer {
    pages: HashMap<String, FakePage>,
    screenshot: Option<Vec<u8>>,
    requests: Mutex<Vec<RenderRequest>>,
}

#[allow(dead_code)]
impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FakePage::Html {
                status: 200,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn page_with_status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FakePage::Html {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn timeout(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), FakePage::Timeout);
        self
    }

    /// PNG bytes returned whenever a screenshot is requested
    pub fn with_screenshot(mut self, png: &[u8]) -> Self {
        self.screenshot = Some(png.to_vec());
        self
    }

    /// URLs requested so far, sorted
    pub fn requested_urls(&self) -> Vec<String> {
        let mut urls: Vec<_> = self
            .requests
            .lock()
            .iter()
            .map(|r| r.url.to_string())
            .collect();
        urls.sort();
        urls
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().clone()
    }
}

impl PageRenderer for FakeRenderer {
    fn render(&self, request: RenderRequest) -> BoxFuture<'_, Result<RenderResult, RenderFailure>> {
        Box::pin(async move {
            self.requests.lock().push(request.clone());

            let page = self
                .pages
                .get(request.url.as_str())
                .cloned()
                .unwrap_or(FakePage::Html {
                    status: 404,
                    body: String::new(),
                });

            match page {
                FakePage::Timeout => Err(RenderFailure::Navigation {
                    url: request.url.to_string(),
                    status: None,
                    message: "navigation timed out after 60s".to_string(),
                }),
                FakePage::Html { status, body } => Ok(RenderResult {
                    status: Some(status),
                    final_url: request.url.clone(),
                    dom_snapshot: body,
                    timing: TimingMetrics {
                        ttfb_ms: Some(10.2),
                        dom_content_loaded_ms: Some(55.5),
                        load_event_ms: Some(90.0),
                        network_idle_ms: Some(120.4),
                    },
                    console_messages: request.capture_console.then(Vec::new),
                    screenshot: if request.screenshot {
                        self.screenshot.clone()
                    } else {
                        None
                    },
                }),
            }
        })
    }
}

/// Language probe answering from a path map; unknown paths declare nothing.
#[derive(Default)]
pub struct FakeLanguageProbe {
    languages: HashMap<String, String>,
    failing: Vec<String>,
}

#[allow(dead_code)]
impl FakeLanguageProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, path: &str, lang: &str) -> Self {
        self.languages.insert(path.to_string(), lang.to_string());
        self
    }

    pub fn fail_on(mut self, path: &str) -> Self {
        self.failing.push(path.to_string());
        self
    }
}

impl LanguageProbe for FakeLanguageProbe {
    fn declared_language<'a>(
        &'a self,
        url: &'a Url,
        _auth: Option<&'a Credentials>,
    ) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move {
            if self.failing.iter().any(|p| p == url.path()) {
                return Err(anyhow!("connection reset"));
            }
            Ok(self.languages.get(url.path()).cloned())
        })
    }
}

/// Minimal HTML page with the given body
#[allow(dead_code)]
pub fn html_page(body: &str) -> String {
    format!("<!DOCTYPE html><html lang=\"en\"><head><title>t</title></head><body>{body}</body></html>")
}

/// Mirrored config writing into `dir`, with throttling off
#[allow(dead_code)]
pub fn mirrored_config(dir: &Path, reference: &str, test: &str, max_depth: u8) -> CrawlConfig {
    CrawlConfig::builder()
        .storage_dir(dir.to_path_buf())
        .test_url(test)
        .reference_url(reference)
        .max_depth(max_depth)
        .throttle(ThrottleConfig::disabled())
        .build()
        .unwrap()
}

/// Data rows of the metrics log (header skipped)
#[allow(dead_code)]
pub fn log_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.records().map(|r| r.unwrap()).collect()
}

/// Log row for `url`, panicking when absent
#[allow(dead_code)]
pub fn row_for<'a>(rows: &'a [csv::StringRecord], url: &str) -> &'a csv::StringRecord {
    rows.iter()
        .find(|r| &r[1] == url)
        .unwrap_or_else(|| panic!("no log row for {url}"))
}

#[allow(dead_code)]
pub fn into_renderer(renderer: &Arc<FakeRenderer>) -> Arc<dyn PageRenderer> {
    Arc::clone(renderer) as Arc<dyn PageRenderer>
}
