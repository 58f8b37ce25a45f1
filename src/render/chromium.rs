//! Chromium-backed renderer
//!
//! Each render opens a fresh tab, applies the resource policy through the
//! Fetch domain, navigates, reads timings, waits for network idle, and
//! optionally strips elements and captures a full-page screenshot. The tab
//! is closed on every exit path by [`PageSession`].

use anyhow::{Context, Result, anyhow};
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, EventResponseReceived, LoaderId, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, EventLifecycleEvent, FrameId,
    GetFrameTreeParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use futures::future::BoxFuture;
use log::{debug, warn};
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

use super::scripts;
use super::{ConsoleMessage, PageRenderer, RenderFailure, RenderRequest, RenderResult, TimingMetrics};
use crate::crawl_engine::page_timeout::with_page_timeout;

/// Independent timeouts for the operations of one render
#[derive(Debug, Clone, Copy)]
pub struct RenderTimeouts {
    pub navigation: Duration,
    pub evaluation: Duration,
    pub network_idle: Duration,
}

/// Renderer sharing one browser across concurrent tasks
pub struct ChromiumRenderer {
    browser: Arc<Browser>,
    timeouts: RenderTimeouts,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(browser: Arc<Browser>, timeouts: RenderTimeouts) -> Self {
        Self { browser, timeouts }
    }

    async fn render_page(&self, request: RenderRequest) -> Result<RenderResult, RenderFailure> {
        let page = with_page_timeout(
            async {
                self.browser
                    .new_page("about:blank")
                    .await
                    .map_err(anyhow::Error::from)
            },
            self.timeouts.navigation,
            "Page creation",
        )
        .await
        .map_err(|e| RenderFailure::Session {
            url: request.url.to_string(),
            message: format!("{e:#}"),
        })?;

        let mut session = PageSession::new(page);
        let outcome = self.drive(&mut session, &request).await;
        session.close().await;
        outcome
    }

    async fn drive(
        &self,
        session: &mut PageSession,
        request: &RenderRequest,
    ) -> Result<RenderResult, RenderFailure> {
        let page = session.page().clone();
        let url = request.url.as_str();
        let session_err = |e: anyhow::Error| RenderFailure::Session {
            url: url.to_string(),
            message: format!("{e:#}"),
        };

        session.spawn(install_resource_policy(&page).await.map_err(session_err)?);
        let status = Arc::new(OnceLock::new());
        session.spawn(
            watch_document_status(&page, Arc::clone(&status))
                .await
                .map_err(session_err)?,
        );

        if let Some(creds) = &request.auth {
            page.authenticate(chromiumoxide::auth::Credentials {
                username: creds.username.clone(),
                password: creds.password.clone(),
            })
            .await
            .map_err(|e| session_err(e.into()))?;
        }

        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| session_err(e.into()))?;
        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| session_err(e.into()))?;

        if request.capture_console {
            page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams {
                source: scripts::CONSOLE_CAPTURE.to_string(),
                world_name: None,
                include_command_line_api: None,
                run_immediately: None,
            })
            .await
            .map_err(|e| session_err(e.into()))?;
        }

        let navigation = with_page_timeout(
            async {
                page.goto(url).await.map_err(anyhow::Error::from)?;
                Ok(())
            },
            self.timeouts.navigation,
            "Navigation",
        )
        .await;
        if let Err(e) = navigation {
            return Err(RenderFailure::Navigation {
                url: url.to_string(),
                status: status.get().copied(),
                message: format!("{e:#}"),
            });
        }

        let mut timing = match self.read_navigation_timing(&page).await {
            Ok(timing) => timing,
            Err(e) => {
                warn!(target: "dualcrawl::render", "Timing capture failed for {url}: {e:#}");
                TimingMetrics::default()
            }
        };

        match self.wait_for_network_idle(&page, &mut lifecycle).await {
            Ok(elapsed) => timing.network_idle_ms = Some(elapsed),
            Err(e) => warn!(target: "dualcrawl::render", "Network idle not reached for {url}: {e:#}"),
        }

        let console_messages = if request.capture_console {
            match self.read_console(&page).await {
                Ok(messages) => Some(messages),
                Err(e) => {
                    warn!(target: "dualcrawl::render", "Console read failed for {url}: {e:#}");
                    Some(Vec::new())
                }
            }
        } else {
            None
        };

        let dom_snapshot = with_page_timeout(
            async { page.content().await.map_err(anyhow::Error::from) },
            self.timeouts.evaluation,
            "DOM snapshot",
        )
        .await
        .map_err(|e| RenderFailure::Navigation {
            url: url.to_string(),
            status: status.get().copied(),
            message: format!("{e:#}"),
        })?;

        let final_url = match page.url().await {
            Ok(Some(current)) => Url::parse(&current).unwrap_or_else(|_| request.url.clone()),
            _ => request.url.clone(),
        };

        let screenshot = if request.screenshot {
            self.strip_elements(&page, &request.strip_selectors).await;
            match self.capture_screenshot(&page).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(target: "dualcrawl::render", "Screenshot failed for {url}: {e:#}");
                    None
                }
            }
        } else {
            None
        };

        Ok(RenderResult {
            status: status.get().copied(),
            final_url,
            dom_snapshot,
            timing,
            console_messages,
            screenshot,
        })
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(
        &self,
        page: &Page,
        script: &str,
        name: &str,
    ) -> Result<T> {
        with_page_timeout(
            async {
                let result = page
                    .evaluate_expression(script)
                    .await
                    .with_context(|| format!("{name} evaluation failed"))?;
                result
                    .into_value::<T>()
                    .with_context(|| format!("{name} returned an unexpected value"))
            },
            self.timeouts.evaluation,
            name,
        )
        .await
    }

    async fn read_navigation_timing(&self, page: &Page) -> Result<TimingMetrics> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct NavigationTiming {
            ttfb: Option<f64>,
            dom_content_loaded: Option<f64>,
            load_event: Option<f64>,
        }

        let raw: NavigationTiming = self
            .evaluate(page, scripts::NAVIGATION_TIMING, "Timing read")
            .await?;
        Ok(TimingMetrics {
            ttfb_ms: raw.ttfb,
            dom_content_loaded_ms: raw.dom_content_loaded,
            load_event_ms: raw.load_event,
            network_idle_ms: None,
        })
    }

    /// Wait for `networkIdle` of the document the navigation committed, then
    /// sample `performance.now()`.
    ///
    /// Lifecycle events of earlier documents in the same frame (the blank tab
    /// included) are still buffered in `lifecycle` and must not end the wait.
    async fn wait_for_network_idle(
        &self,
        page: &Page,
        lifecycle: &mut EventStream<EventLifecycleEvent>,
    ) -> Result<f64> {
        let tree = page
            .execute(GetFrameTreeParams::default())
            .await
            .context("Frame tree read failed")?;
        let frame = &tree.result.frame_tree.frame;
        let mut tracker = IdleTracker::new(frame.id.clone(), frame.loader_id.clone());

        with_page_timeout(
            async {
                while let Some(event) = lifecycle.next().await {
                    if tracker.observe(&event) {
                        return Ok(());
                    }
                }
                Err(anyhow!("Lifecycle event stream closed"))
            },
            self.timeouts.network_idle,
            "Network idle wait",
        )
        .await?;

        self.evaluate(page, scripts::PERFORMANCE_NOW, "Idle clock read")
            .await
    }

    async fn read_console(&self, page: &Page) -> Result<Vec<ConsoleMessage>> {
        self.evaluate(page, scripts::CONSOLE_READ, "Console read").await
    }

    /// Remove every element matching the configured selectors. A selector
    /// matching nothing leaves the page untouched.
    async fn strip_elements(&self, page: &Page, selectors: &[String]) {
        for selector in selectors {
            let script = scripts::strip_selector(selector);
            match self.evaluate::<u64>(page, &script, "Selector strip").await {
                Ok(removed) => debug!(
                    target: "dualcrawl::render",
                    "Removed {removed} element(s) matching '{selector}'"
                ),
                Err(e) => warn!(
                    target: "dualcrawl::render",
                    "Could not strip '{selector}': {e:#}"
                ),
            }
        }
    }

    async fn capture_screenshot(&self, page: &Page) -> Result<Vec<u8>> {
        with_page_timeout(
            async {
                page.screenshot(
                    ScreenshotParams::builder()
                        .format(CaptureScreenshotFormat::Png)
                        .full_page(true)
                        .build(),
                )
                .await
                .map_err(anyhow::Error::from)
            },
            self.timeouts.navigation,
            "Screenshot",
        )
        .await
    }
}

impl PageRenderer for ChromiumRenderer {
    fn render(&self, request: RenderRequest) -> BoxFuture<'_, Result<RenderResult, RenderFailure>> {
        Box::pin(self.render_page(request))
    }
}

/// Allow only document and script requests; everything else fails before it hits the network.
async fn install_resource_policy(page: &Page) -> Result<JoinHandle<()>> {
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("Failed to subscribe to paused requests")?;
    let page = page.clone();

    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let allowed = matches!(
                event.resource_type,
                ResourceType::Document | ResourceType::Script
            );
            let outcome = if allowed {
                page.execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ())
            } else {
                page.execute(FailRequestParams::new(
                    event.request_id.clone(),
                    ErrorReason::BlockedByClient,
                ))
                .await
                .map(|_| ())
            };
            if let Err(e) = outcome {
                debug!(
                    target: "dualcrawl::render",
                    "Interception reply failed for {}: {e}",
                    event.request.url
                );
            }
        }
    }))
}

/// Follows the lifecycle of one document: `networkIdle` counts only once
/// the same frame and loader reported `init`.
#[derive(Debug)]
struct IdleTracker {
    frame: FrameId,
    loader: LoaderId,
    init_seen: bool,
}

impl IdleTracker {
    fn new(frame: FrameId, loader: LoaderId) -> Self {
        Self {
            frame,
            loader,
            init_seen: false,
        }
    }

    /// Feed one event; `true` once the tracked document is network idle.
    fn observe(&mut self, event: &EventLifecycleEvent) -> bool {
        if event.frame_id != self.frame || event.loader_id != self.loader {
            return false;
        }
        match event.name.as_str() {
            "init" => {
                self.init_seen = true;
                false
            }
            "networkIdle" => self.init_seen,
            _ => false,
        }
    }
}

/// Record the status of the first document response seen by the page.
async fn watch_document_status(
    page: &Page,
    status: Arc<OnceLock<u16>>,
) -> Result<JoinHandle<()>> {
    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .context("Failed to subscribe to responses")?;

    Ok(tokio::spawn(async move {
        while let Some(event) = responses.next().await {
            if matches!(event.r#type, ResourceType::Document) {
                let code = u16::try_from(event.response.status).unwrap_or_default();
                // First document response wins; later ones belong to subframes
                let _ = status.set(code);
                break;
            }
        }
    }))
}

/// Scoped ownership of one browser tab and its helper tasks.
///
/// `close` releases both explicitly; if the render future is dropped
/// instead, `Drop` aborts the helpers and schedules the tab close.
struct PageSession {
    page: Page,
    helpers: Vec<JoinHandle<()>>,
    closed: bool,
}

impl PageSession {
    fn new(page: Page) -> Self {
        Self {
            page,
            helpers: Vec::new(),
            closed: false,
        }
    }

    fn page(&self) -> &Page {
        &self.page
    }

    fn spawn(&mut self, handle: JoinHandle<()>) {
        self.helpers.push(handle);
    }

    async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            warn!(target: "dualcrawl::render", "Failed to close page: {e}");
        }
        for helper in self.helpers.drain(..) {
            helper.abort();
        }
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        for helper in self.helpers.drain(..) {
            helper.abort();
        }
        if self.closed {
            return;
        }
        let page = self.page.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        debug!(target: "dualcrawl::render", "Deferred page close failed: {e}");
                    }
                });
            }
            Err(_) => warn!(target: "dualcrawl::render", "No runtime to close abandoned page"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chromiumoxide::cdp::browser_protocol::network::MonotonicTime;

    fn event(frame: &str, loader: &str, name: &str) -> EventLifecycleEvent {
        EventLifecycleEvent {
            frame_id: FrameId::new(frame),
            loader_id: LoaderId::new(loader),
            name: name.to_string(),
            timestamp: MonotonicTime::new(0.0),
        }
    }

    #[test]
    fn idle_of_blank_document_is_ignored() {
        let mut tracker = IdleTracker::new(FrameId::new("main"), LoaderId::new("nav"));
        assert!(!tracker.observe(&event("main", "blank", "init")));
        assert!(!tracker.observe(&event("main", "blank", "networkIdle")));
        assert!(!tracker.observe(&event("child", "nav", "init")));
        assert!(!tracker.observe(&event("child", "nav", "networkIdle")));
        assert!(!tracker.observe(&event("main", "nav", "init")));
        assert!(!tracker.observe(&event("main", "nav", "load")));
        assert!(tracker.observe(&event("main", "nav", "networkIdle")));
    }

    #[test]
    fn idle_before_init_does_not_count() {
        let mut tracker = IdleTracker::new(FrameId::new("main"), LoaderId::new("nav"));
        assert!(!tracker.observe(&event("main", "nav", "networkIdle")));
        assert!(!tracker.observe(&event("main", "nav", "init")));
        assert!(tracker.observe(&event("main", "nav", "networkIdle")));
    }
}
