// src/cache/content.rs
use metrics::counter;
use tracing::{debug, warn};

use super::SharedStore;
use crate::error::Result;
use crate::listing::{NewsletterSource, PostMeta};
use crate::strip::strip_html;

/// Stripped post bodies keyed by post id. Hits are returned without any
/// freshness check.
#[derive(Clone)]
pub struct ContentCache {
    store: SharedStore,
}

impl ContentCache {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn get_content(&self, source: &dyn NewsletterSource, post: &PostMeta) -> Result<String> {
        if let Some(id) = post.id.as_deref() {
            if let Some(hit) = self.store.get(id)? {
                counter!("content_cache_hits_total").increment(1);
                debug!(post_id = id, "content cache hit");
                return Ok(hit);
            }
        }

        counter!("content_cache_misses_total").increment(1);
        let raw = source.post_content(post).await?;
        let content = strip_html(&raw);

        match post.id.as_deref() {
            Some(id) => self.store.put(id, &content)?,
            None => warn!(title = %post.title, "post without id; content not cached"),
        }
        Ok(content)
    }
}
