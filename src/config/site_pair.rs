//! The reference/test site pair, derived once from the configuration.

use anyhow::{Context, Result, anyhow};
use std::fmt;
use url::Url;

use super::types::CrawlConfig;
use crate::crawl_engine::Phase;

/// HTTP credentials taken from a base URL's user-info
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// One side of the pair
#[derive(Debug, Clone)]
pub struct Site {
    /// Base URL with any credentials removed
    pub base_url: Url,
    /// Lower-cased host name used for same-domain checks
    pub domain: String,
    pub auth: Option<Credentials>,
}

impl Site {
    /// Parse a base URL, splitting off its credentials.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut base_url = Url::parse(raw).with_context(|| format!("Invalid base URL '{raw}'"))?;
        let domain = base_url
            .host_str()
            .ok_or_else(|| anyhow!("Base URL '{raw}' has no host"))?
            .to_lowercase();

        let auth = extract_credentials(&base_url)?;
        if auth.is_some() || !base_url.username().is_empty() {
            base_url
                .set_username("")
                .map_err(|()| anyhow!("Cannot strip username from '{raw}'"))?;
            base_url
                .set_password(None)
                .map_err(|()| anyhow!("Cannot strip password from '{raw}'"))?;
        }

        Ok(Self {
            base_url,
            domain,
            auth,
        })
    }

    /// Whether `url` lives on this site's host
    #[must_use]
    pub fn owns(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.domain))
    }
}

/// Credentials are only honoured when both user and password are present
fn extract_credentials(url: &Url) -> Result<Option<Credentials>> {
    let (Some(password), false) = (url.password(), url.username().is_empty()) else {
        return Ok(None);
    };
    let username = urlencoding::decode(url.username())
        .context("Username in base URL is not valid UTF-8")?
        .into_owned();
    let password = urlencoding::decode(password)
        .context("Password in base URL is not valid UTF-8")?
        .into_owned();
    Ok(Some(Credentials { username, password }))
}

/// Reference and test sites of one crawl run. Immutable for the run's lifetime.
#[derive(Debug, Clone)]
pub struct SitePair {
    pub reference: Option<Site>,
    pub test: Site,
}

impl SitePair {
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        let reference = config.reference_url().map(Site::parse).transpose()?;
        let test = Site::parse(config.test_url())?;
        Ok(Self { reference, test })
    }

    /// Site targeted by a phase. `None` only for the reference phase of a test-only run.
    #[must_use]
    pub fn site(&self, phase: Phase) -> Option<&Site> {
        match phase {
            Phase::Reference => self.reference.as_ref(),
            Phase::Test => Some(&self.test),
        }
    }

    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        self.reference.is_some()
    }
}
