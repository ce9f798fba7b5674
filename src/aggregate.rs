// src/aggregate.rs
//! Aggregation engine: recent posts across newsletters, cutoff filter, content +
//! summary enrichment, one globally date-sorted list.
//!
//! Failure policy: a post (or a whole newsletter listing) that fails to fetch or
//! summarize is skipped with a warning; configuration errors such as a missing API
//! key abort the whole run. A post is never returned with missing fields.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{ContentCache, Summarizer, Summary};
use crate::error::{Error, Result};
use crate::listing::{NewsletterSource, PostMeta, Recommendation};

pub const DEFAULT_LIST_LIMIT: usize = 7;
pub const DEFAULT_POSTS_LIMIT: usize = 5;
pub const DEFAULT_CUTOFF_DAYS: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichedPost {
    pub id: Option<String>,
    pub title: String,
    pub url: String,
    pub post_date: String,
    /// Only filled by the single-newsletter listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub summary: Summary,
}

/// `today - days` as `YYYY-MM-DD`.
pub fn default_cutoff(days: i64) -> String {
    (Local::now().date_naive() - Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

/// Accept only zero-padded `YYYY-MM-DD`, so lexicographic comparison equals date order.
pub fn validate_cutoff(raw: &str) -> Result<String> {
    let s = raw.trim();
    if s.len() != 10 || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
        return Err(Error::InvalidInput(format!(
            "cut_off '{raw}' must look like YYYY-MM-DD"
        )));
    }
    Ok(s.to_string())
}

/// Inclusive lower bound on the day string.
pub fn passes_cutoff(day: &str, cutoff: Option<&str>) -> bool {
    cutoff.map_or(true, |c| day >= c)
}

/// Most recent first; ties keep no particular order.
pub fn sort_newest_first(posts: &mut [EnrichedPost]) {
    posts.sort_by(|a, b| b.post_date.cmp(&a.post_date));
}

pub struct Aggregator {
    source: Arc<dyn NewsletterSource>,
    content: ContentCache,
    summarizer: Summarizer,
    list_limit: usize,
    posts_limit: usize,
    cutoff_days: i64,
}

impl Aggregator {
    pub fn new(source: Arc<dyn NewsletterSource>, content: ContentCache, summarizer: Summarizer) -> Self {
        Self {
            source,
            content,
            summarizer,
            list_limit: DEFAULT_LIST_LIMIT,
            posts_limit: DEFAULT_POSTS_LIMIT,
            cutoff_days: DEFAULT_CUTOFF_DAYS,
        }
    }

    pub fn with_limits(mut self, list_limit: usize, posts_limit: usize, cutoff_days: i64) -> Self {
        self.list_limit = list_limit;
        self.posts_limit = posts_limit;
        self.cutoff_days = cutoff_days;
        self
    }

    /// Combined list over `newsletters`. `cutoff` defaults to today minus the configured days.
    pub async fn build_list(&self, newsletters: &[String], cutoff: Option<&str>) -> Result<Vec<EnrichedPost>> {
        let cutoff = match cutoff {
            Some(c) => validate_cutoff(c)?,
            None => default_cutoff(self.cutoff_days),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for newsletter in newsletters {
            let posts = match self.source.recent_posts(newsletter, self.list_limit).await {
                Ok(p) => p,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(error = %e, %newsletter, provider = self.source.name(), "listing failed; skipping newsletter");
                    counter!("aggregate_skipped_total").increment(1);
                    continue;
                }
            };
            for post in &posts {
                if let Some(id) = post.id.as_deref() {
                    if !seen.insert(id.to_string()) {
                        continue;
                    }
                }
                if let Some(p) = self.enrich_or_skip(post, Some(&cutoff), false).await? {
                    out.push(p);
                }
            }
        }

        sort_newest_first(&mut out);
        gauge!("aggregate_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        info!(newsletters = newsletters.len(), posts = out.len(), %cutoff, "built list");
        Ok(out)
    }

    /// Recent posts of one newsletter with their stripped content. Without a cutoff
    /// every dated post is kept.
    pub async fn get_posts(&self, newsletter: &str, cutoff: Option<&str>) -> Result<Vec<EnrichedPost>> {
        let cutoff = cutoff.map(validate_cutoff).transpose()?;
        let posts = self.source.recent_posts(newsletter, self.posts_limit).await?;

        let mut out = Vec::with_capacity(posts.len());
        for post in &posts {
            if let Some(p) = self.enrich_or_skip(post, cutoff.as_deref(), true).await? {
                out.push(p);
            }
        }
        sort_newest_first(&mut out);
        Ok(out)
    }

    pub async fn recommendations(&self, newsletter: &str) -> Result<Vec<Recommendation>> {
        self.source.recommendations(newsletter).await
    }

    /// `Ok(None)` for posts filtered out or skipped after a non-fatal error.
    async fn enrich_or_skip(
        &self,
        post: &PostMeta,
        cutoff: Option<&str>,
        with_content: bool,
    ) -> Result<Option<EnrichedPost>> {
        let Some(day) = post.day() else {
            warn!(title = %post.title, "post without usable date; skipping");
            return Ok(None);
        };
        if !passes_cutoff(day, cutoff) {
            return Ok(None);
        }
        match self.enrich(post, day, with_content).await {
            Ok(p) => Ok(Some(p)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(error = %e, title = %post.title, url = %post.canonical_url, "post skipped");
                counter!("aggregate_skipped_total").increment(1);
                Ok(None)
            }
        }
    }

    async fn enrich(&self, post: &PostMeta, day: &str, with_content: bool) -> Result<EnrichedPost> {
        let text = self.content.get_content(self.source.as_ref(), post).await?;
        let summary = match post.id.as_deref() {
            Some(id) => self.summarizer.summarize(id, &text).await?,
            None => self.summarizer.summarize_uncached(&text).await?,
        };
        Ok(EnrichedPost {
            id: post.id.clone(),
            title: post.title.clone(),
            url: post.canonical_url.clone(),
            post_date: day.to_string(),
            content: with_content.then_some(text),
            summary,
        })
    }
}
