//! Chromium renderer against local servers.
//!
//! These launch a real browser. Run with `cargo test -- --ignored` on a host
//! with Chrome or Chromium installed; without one each test returns early.

use anyhow::Result;
use chromiumoxide::Browser;
use dualcrawl::crawl_engine::cleanup::cleanup_browser_and_data;
use dualcrawl::render::{ChromiumRenderer, RenderTimeouts};
use dualcrawl::{PageRenderer, RenderFailure, RenderRequest, find_browser_executable, launch_browser};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

const TIMEOUTS: RenderTimeouts = RenderTimeouts {
    navigation: Duration::from_secs(5),
    evaluation: Duration::from_secs(5),
    network_idle: Duration::from_secs(5),
};

struct TestBrowser {
    browser: Arc<Browser>,
    renderer: ChromiumRenderer,
    _handler: JoinHandle<()>,
    _profile: TempDir,
}

impl TestBrowser {
    /// `None` when no local browser is installed
    async fn launch() -> Result<Option<Self>> {
        if find_browser_executable().is_err() {
            eprintln!("No Chrome/Chromium found, skipping");
            return Ok(None);
        }
        let profile = TempDir::new()?;
        let (browser, handler, _) = launch_browser(true, Some(profile.path().to_path_buf())).await?;
        let browser = Arc::new(browser);
        Ok(Some(Self {
            renderer: ChromiumRenderer::new(Arc::clone(&browser), TIMEOUTS),
            browser,
            _handler: handler,
            _profile: profile,
        }))
    }

    async fn tab_count(&self) -> Result<usize> {
        Ok(self.browser.pages().await?.len())
    }

    /// Tab closing is reported asynchronously; give the handler a moment.
    async fn wait_for_tab_count(&self, expected: usize) -> Result<usize> {
        let mut count = self.tab_count().await?;
        for _ in 0..50 {
            if count == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            count = self.tab_count().await?;
        }
        Ok(count)
    }

    async fn shutdown(self) {
        let Self {
            browser, renderer, ..
        } = self;
        drop(renderer);
        if let Ok(browser) = Arc::try_unwrap(browser) {
            cleanup_browser_and_data(browser, None).await;
        }
    }
}

fn request(url: &str) -> RenderRequest {
    RenderRequest {
        url: Url::parse(url).unwrap(),
        auth: None,
        screenshot: false,
        strip_selectors: Vec::new(),
        capture_console: false,
    }
}

#[tokio::test]
#[ignore = "launches a local Chrome"]
async fn test_images_are_blocked_before_the_network() -> Result<()> {
    let Some(chrome) = TestBrowser::launch().await? else {
        return Ok(());
    };
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(r#"<html><body><p>Hi</p><img src="/pixel.png"></body></html>"#)
        .create_async()
        .await;
    let pixel = server
        .mock("GET", "/pixel.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .expect(0)
        .create_async()
        .await;

    let result = chrome
        .renderer
        .render(request(&format!("{}/", server.url())))
        .await?;

    assert_eq!(result.status, Some(200));
    assert!(result.dom_snapshot.contains("<p>Hi</p>"));
    pixel.assert_async().await;

    chrome.shutdown().await;
    Ok(())
}

#[tokio::test]
#[ignore = "launches a local Chrome"]
async fn test_unmatched_strip_selector_leaves_screenshot_unchanged() -> Result<()> {
    let Some(chrome) = TestBrowser::launch().await? else {
        return Ok(());
    };
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(
            r#"<html><body style="margin:0;background:#fff">
                <h1 style="font:20px monospace">Static</h1>
                <div id="banner" style="height:40px;background:#c00"></div>
            </body></html>"#,
        )
        .expect_at_least(2)
        .create_async()
        .await;
    let url = format!("{}/", server.url());

    let plain = chrome
        .renderer
        .render(RenderRequest {
            screenshot: true,
            ..request(&url)
        })
        .await?;
    let stripped = chrome
        .renderer
        .render(RenderRequest {
            screenshot: true,
            strip_selectors: vec!["#does-not-exist".to_string(), ".nothing > p".to_string()],
            ..request(&url)
        })
        .await?;

    let plain = plain.screenshot.expect("screenshot without selectors");
    let stripped = stripped.screenshot.expect("screenshot with selectors");
    assert!(plain.starts_with(b"\x89PNG"));
    assert_eq!(plain, stripped);

    chrome.shutdown().await;
    Ok(())
}

#[tokio::test]
#[ignore = "launches a local Chrome"]
async fn test_hanging_server_is_a_navigation_failure_without_status() -> Result<()> {
    let Some(chrome) = TestBrowser::launch().await? else {
        return Ok(());
    };

    // Accepts connections and never answers
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let failure = chrome
        .renderer
        .render(request(&format!("http://{addr}/hang")))
        .await
        .expect_err("navigation should time out");

    assert!(matches!(failure, RenderFailure::Navigation { .. }), "{failure:?}");
    assert_eq!(failure.status(), None);

    silent.abort();
    chrome.shutdown().await;
    Ok(())
}

#[tokio::test]
#[ignore = "launches a local Chrome"]
async fn test_tab_is_closed_after_every_render() -> Result<()> {
    let Some(chrome) = TestBrowser::launch().await? else {
        return Ok(());
    };
    let mut server = mockito::Server::new_async().await;
    let _ok = server
        .mock("GET", "/ok")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body>ok</body></html>")
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_header("content-type", "text/html")
        .with_body("<html><body>gone</body></html>")
        .create_async()
        .await;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let hanging = format!("http://{}/hang", listener.local_addr()?);
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let baseline = chrome.tab_count().await?;
    let urls = [
        format!("{}/ok", server.url()),
        format!("{}/missing", server.url()),
        hanging,
    ];
    for url in &urls {
        let _ = chrome
            .renderer
            .render(RenderRequest {
                screenshot: true,
                ..request(url)
            })
            .await;
        assert_eq!(
            chrome.wait_for_tab_count(baseline).await?,
            baseline,
            "tab leaked after rendering {url}"
        );
    }

    silent.abort();
    chrome.shutdown().await;
    Ok(())
}
