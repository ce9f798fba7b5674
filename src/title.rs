// src/title.rs
//! Page title / Substack tagline scraper.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fetch::{normalize_url, Fetcher};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitleInfo {
    pub title: String,
    pub subtitle: Option<String>,
}

fn title_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)<title[^>]*>([\s\S]*?)</title>").expect("title regex"))
}

// <p class="... publication-tagline ... with-cover ..."> in either order
fn tagline_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)<p\s[^>]*class="[^"]*(?:publication-tagline[^"]*with-cover|with-cover[^"]*publication-tagline)[^"]*"[^>]*>([\s\S]*?)</p>"#,
        )
        .expect("tagline regex")
    })
}

fn decode(s: &str) -> String {
    html_escape::decode_html_entities(s.trim()).into_owned()
}

/// Title (empty when absent) and tagline subtitle (None when absent or empty).
pub fn extract_title_info(html: &str) -> TitleInfo {
    let title = title_re()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode(m.as_str()))
        .unwrap_or_default();
    let subtitle = tagline_re()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode(m.as_str()))
        .filter(|s| !s.is_empty());
    TitleInfo { title, subtitle }
}

/// Fetch raw markup (bounded redirects, no stripping) and extract title + subtitle.
pub async fn get_title(fetcher: &Fetcher, url: &str, redirect_limit: u32) -> Result<TitleInfo> {
    let url = normalize_url(url)?;
    let raw = fetcher.get_raw(&url, redirect_limit).await?;
    Ok(extract_title_info(&raw))
}
