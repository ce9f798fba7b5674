// src/lib.rs
// Public library surface for the server binary, the CLI helper and integration tests.

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod listing;
pub mod llm;
pub mod metrics;
pub mod strip;
pub mod title;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{Aggregator, EnrichedPost};
pub use crate::api::create_router;
pub use crate::error::{Error, Result};
pub use crate::strip::strip_html;
