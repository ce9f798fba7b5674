// src/listing/mod.rs
//! Newsletter listing collaborator: recent posts, post bodies, recommendations.

pub mod config;
pub mod substack;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use substack::SubstackClient;

/// Metadata of one newsletter post as returned by the listing service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostMeta {
    /// Stable upstream id; used as cache key. Absent ids disable caching.
    pub id: Option<String>,
    pub title: String,
    pub canonical_url: String,
    /// Raw upstream timestamp, e.g. `2026-02-10T08:30:00.000Z`.
    pub post_date: Option<String>,
    /// Root URL of the newsletter the post belongs to.
    pub newsletter_url: String,
    pub slug: Option<String>,
}

impl PostMeta {
    /// Publication date at day precision (`YYYY-MM-DD`), if the upstream value is long enough.
    pub fn day(&self) -> Option<&str> {
        self.post_date.as_deref().and_then(|d| d.get(..10))
    }
}

/// A related newsletter suggested by a publication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub name: String,
    pub url: String,
}

#[async_trait::async_trait]
pub trait NewsletterSource: Send + Sync {
    /// Most recent posts first, at most `limit`.
    async fn recent_posts(&self, newsletter_url: &str, limit: usize) -> Result<Vec<PostMeta>>;
    /// Full raw (HTML) content of a post.
    async fn post_content(&self, post: &PostMeta) -> Result<String>;
    async fn recommendations(&self, newsletter_url: &str) -> Result<Vec<Recommendation>>;
    fn name(&self) -> &'static str;
}
