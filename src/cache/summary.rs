// src/cache/summary.rs
//! Per-post summaries: cache first, LLM on a miss.

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::SharedStore;
use crate::error::{Error, Result};
use crate::llm::DynCompletion;

/// Instruction sent with every article.
pub const SUMMARY_INSTRUCTION: &str = "You summarize an article in two ways: short and full.
The short summary should be 50 words or less.
The full summary should be around 200 words.
Return a JSON object with the string fields \"short\" and \"full\".
Return pure JSON, no markdown or other formatting.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub short: String,
    pub full: String,
}

/// Validate a model response as a `{short, full}` object.
pub fn parse_summary(raw: &str) -> Result<Summary> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())
        .map_err(|e| Error::MalformedModelResponse(e.to_string()))?;
    // serde would otherwise accept a two-element array
    if !value.is_object() {
        return Err(Error::MalformedModelResponse("expected a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| Error::MalformedModelResponse(e.to_string()))
}

#[derive(Clone)]
pub struct Summarizer {
    store: SharedStore,
    llm: DynCompletion,
}

impl Summarizer {
    pub fn new(store: SharedStore, llm: DynCompletion) -> Self {
        Self { store, llm }
    }

    /// Cached summary for `id`, asking the model only on a miss. Malformed model
    /// output is returned as an error and never cached.
    pub async fn summarize(&self, id: &str, text: &str) -> Result<Summary> {
        if let Some(cached) = self.store.get(id)? {
            match serde_json::from_str::<Summary>(&cached) {
                Ok(s) => {
                    counter!("summary_cache_hits_total").increment(1);
                    debug!(post_id = id, "summary cache hit");
                    return Ok(s);
                }
                Err(e) => warn!(post_id = id, error = %e, "unreadable summary cache entry; recomputing"),
            }
        }

        counter!("summary_cache_misses_total").increment(1);
        info!(post_id = id, provider = self.llm.provider_name(), "summarizing with LLM");
        let summary = self.ask(text).await?;
        let json = serde_json::to_string(&summary)
            .map_err(|e| Error::MalformedModelResponse(e.to_string()))?;
        self.store.put(id, &json)?;
        Ok(summary)
    }

    /// Summarize without touching the cache (posts that carry no id).
    pub async fn summarize_uncached(&self, text: &str) -> Result<Summary> {
        counter!("summary_cache_misses_total").increment(1);
        self.ask(text).await
    }

    async fn ask(&self, text: &str) -> Result<Summary> {
        let raw = self.llm.complete(SUMMARY_INSTRUCTION, text).await?;
        parse_summary(&raw)
    }
}
