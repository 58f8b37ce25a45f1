//! Language admission filter
//!
//! Before a page is rendered, a plain HTTP fetch reads the document root's
//! `lang` attribute. Pages whose declared language does not match the
//! configured target are dropped without artifacts or a log row.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use crate::config::Credentials;
use crate::utils::CHROME_USER_AGENT;

/// Source of a page's declared language
pub trait LanguageProbe: Send + Sync {
    /// Return the `<html lang>` value of `url`, `None` when the attribute is absent.
    fn declared_language<'a>(
        &'a self,
        url: &'a Url,
        auth: Option<&'a Credentials>,
    ) -> BoxFuture<'a, Result<Option<String>>>;
}

/// Probe that fetches the raw document over HTTP
pub struct HttpLanguageProbe {
    client: Client,
}

impl HttpLanguageProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(CHROME_USER_AGENT)
            .build()
            .context("Failed to build HTTP client for language probe")?;
        Ok(Self { client })
    }
}

impl LanguageProbe for HttpLanguageProbe {
    fn declared_language<'a>(
        &'a self,
        url: &'a Url,
        auth: Option<&'a Credentials>,
    ) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move {
            let mut request = self.client.get(url.clone());
            if let Some(creds) = auth {
                request = request.basic_auth(&creds.username, Some(&creds.password));
            }
            let body = request
                .send()
                .await
                .with_context(|| format!("Language probe request failed: {url}"))?
                .error_for_status()
                .with_context(|| format!("Language probe got error status: {url}"))?
                .text()
                .await
                .with_context(|| format!("Language probe body unreadable: {url}"))?;
            Ok(extract_html_lang(&body))
        })
    }
}

/// Read the `lang` attribute of the document's `<html>` element.
#[must_use]
pub fn extract_html_lang(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("html").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|root| root.value().attr("lang"))
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
}

/// Case-insensitive comparison of the full language tag
#[must_use]
pub fn language_matches(declared: Option<&str>, target: &str) -> bool {
    declared.is_some_and(|lang| lang.eq_ignore_ascii_case(target))
}
