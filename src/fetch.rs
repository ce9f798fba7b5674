// src/fetch.rs
//! Article fetcher with manual, bounded redirect handling.

use std::time::Duration;

use metrics::counter;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::Url;
use tracing::debug;

use crate::error::{Error, Result};
use crate::strip::{looks_like_html, strip_html};

pub const DEFAULT_REDIRECT_LIMIT: u32 = 10;
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; newsletter-digest/0.1)";

const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

/// Upgrade a schemeless URL to `https://` and validate it.
///
/// Anything that still does not parse as an absolute http(s) URL with a host is
/// rejected before any network activity.
pub fn normalize_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("url is empty".into()));
    }
    let candidate = if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| Error::InvalidInput(format!("'{trimmed}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::InvalidInput(format!("'{trimmed}' is not an http(s) URL")));
    }
    Ok(url.to_string())
}

/// HTTP GET that follows redirects itself so relative `Location` headers can be
/// resolved against the current URL and the hop count stays bounded.
#[derive(Clone)]
pub struct Fetcher {
    http: reqwest::Client,
}

impl Fetcher {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Body of `url` after at most `redirect_limit - 1` redirects, decoded lossily as UTF-8.
    pub async fn get_raw(&self, url: &str, redirect_limit: u32) -> Result<String> {
        let mut current =
            Url::parse(url).map_err(|e| Error::InvalidInput(format!("'{url}': {e}")))?;
        let mut budget = redirect_limit;

        loop {
            if budget == 0 {
                return Err(Error::RedirectLimitExceeded {
                    url: current.to_string(),
                });
            }

            let resp = self
                .http
                .get(current.clone())
                .send()
                .await
                .map_err(|e| Error::fetch(current.as_str(), e))?;
            let status = resp.status();

            if REDIRECT_CODES.contains(&status.as_u16()) {
                let location = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string);
                let Some(location) = location else {
                    return Err(Error::fetch(
                        current.as_str(),
                        format!("HTTP {status} without Location"),
                    ));
                };
                let next = current.join(&location).map_err(|e| {
                    Error::fetch(current.as_str(), format!("bad Location '{location}': {e}"))
                })?;
                debug!(from = %current, to = %next, remaining = budget - 1, "following redirect");
                counter!("fetch_redirects_total").increment(1);
                current = next;
                budget -= 1;
                continue;
            }

            if !status.is_success() {
                return Err(Error::fetch(current.as_str(), format!("HTTP {status}")));
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| Error::fetch(current.as_str(), e))?;
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
    }

    /// Like [`Fetcher::get_raw`], but markup is reduced to plain text.
    pub async fn get_article(&self, url: &str, redirect_limit: u32) -> Result<String> {
        let raw = self.get_raw(url, redirect_limit).await?;
        if looks_like_html(&raw) {
            Ok(strip_html(&raw))
        } else {
            Ok(raw)
        }
    }
}
