// tests/common/mod.rs
// Shared fakes for the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use newsletter_digest::cache::{ContentCache, MemoryStore, Summarizer};
use newsletter_digest::error::{Error, Result};
use newsletter_digest::listing::{NewsletterSource, PostMeta, Recommendation};
use newsletter_digest::llm::MockCompletion;
use newsletter_digest::Aggregator;

pub const SUMMARY_JSON: &str = r#"{"short": "Short take.", "full": "A longer take on the article."}"#;

pub fn meta(newsletter: &str, id: Option<&str>, date: &str, slug: &str) -> PostMeta {
    PostMeta {
        id: id.map(str::to_string),
        title: format!("Title {slug}"),
        canonical_url: format!("{}p/{slug}", newsletter),
        post_date: Some(format!("{date}T09:00:00.000Z")),
        newsletter_url: newsletter.to_string(),
        slug: Some(slug.to_string()),
    }
}

/// In-memory listing service. Post bodies are `<p>Body of {slug}</p>` unless the slug
/// is marked as failing.
#[derive(Default)]
pub struct FakeSource {
    pub feeds: HashMap<String, Vec<PostMeta>>,
    pub failing_slugs: HashSet<String>,
    pub failing_feeds: HashSet<String>,
    pub recommended: Vec<Recommendation>,
    content_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, newsletter: &str, posts: Vec<PostMeta>) -> Self {
        self.feeds.insert(newsletter.to_string(), posts);
        self
    }

    pub fn failing_slug(mut self, slug: &str) -> Self {
        self.failing_slugs.insert(slug.to_string());
        self
    }

    pub fn failing_feed(mut self, newsletter: &str) -> Self {
        self.failing_feeds.insert(newsletter.to_string());
        self
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsletterSource for FakeSource {
    async fn recent_posts(&self, newsletter_url: &str, limit: usize) -> Result<Vec<PostMeta>> {
        if self.failing_feeds.contains(newsletter_url) {
            return Err(Error::fetch(newsletter_url, "HTTP 503 Service Unavailable"));
        }
        Ok(self
            .feeds
            .get(newsletter_url)
            .map(|v| v.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn post_content(&self, post: &PostMeta) -> Result<String> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        let slug = post.slug.clone().unwrap_or_default();
        if self.failing_slugs.contains(&slug) {
            return Err(Error::fetch(&post.canonical_url, "HTTP 500 Internal Server Error"));
        }
        Ok(format!(
            "<html><head><script>track()</script></head><body><p>Body of {slug}</p></body></html>"
        ))
    }

    async fn recommendations(&self, _newsletter_url: &str) -> Result<Vec<Recommendation>> {
        Ok(self.recommended.clone())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub llm: Arc<MockCompletion>,
    pub content_store: Arc<MemoryStore>,
    pub summary_store: Arc<MemoryStore>,
    pub aggregator: Arc<Aggregator>,
}

pub fn harness(source: FakeSource, llm_reply: &str) -> Harness {
    let source = Arc::new(source);
    let llm = Arc::new(MockCompletion::new(llm_reply));
    let content_store = Arc::new(MemoryStore::new());
    let summary_store = Arc::new(MemoryStore::new());
    let aggregator = Arc::new(Aggregator::new(
        source.clone(),
        ContentCache::new(content_store.clone()),
        Summarizer::new(summary_store.clone(), llm.clone()),
    ));
    Harness {
        source,
        llm,
        content_store,
        summary_store,
        aggregator,
    }
}

/// Serve `app` on an ephemeral local port; returns `http://127.0.0.1:<port>`.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}
