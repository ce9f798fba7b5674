//! LLM provider abstraction: one chat-completion call, system instruction + user text in,
//! generated text out. Providers do not retry; callers decide what a failure means.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Trait object used by the summarizer (and replaced by fakes in tests).
pub trait CompletionClient: Send + Sync {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompletionFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynCompletion = Arc<dyn CompletionClient>;

// ------------------------------------------------------------
// Groq (OpenAI-compatible chat completions)
// ------------------------------------------------------------

pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    /// An empty `api_key` is accepted here and reported as `MissingCredential` on first use.
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    async fn complete_impl(&self, system: &str, user: &str) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(Error::MissingCredential(API_KEY_ENV));
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        info!(model = %self.model, chars = user.len(), "llm completion request");
        counter!("llm_calls_total").increment(1);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::fetch(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            counter!("llm_errors_total").increment(1);
            return Err(Error::fetch(&url, format!("HTTP {status}")));
        }
        let body: Resp = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamShape(format!("{url}: {e}")))?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

impl CompletionClient for GroqClient {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompletionFuture<'a> {
        Box::pin(self.complete_impl(system, user))
    }
    fn provider_name(&self) -> &'static str {
        "groq"
    }
}

// ------------------------------------------------------------
// Fixed-response provider for tests/local runs
// ------------------------------------------------------------

/// Returns the same text for every call and counts how often it was asked.
#[derive(Debug, Default)]
pub struct MockCompletion {
    pub fixed: String,
    calls: AtomicUsize,
}

impl MockCompletion {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionClient for MockCompletion {
    fn complete<'a>(&'a self, _system: &'a str, _user: &'a str) -> CompletionFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
