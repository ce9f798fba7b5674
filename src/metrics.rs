use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe the pipeline series.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("content_cache_hits_total", "Post bodies served from the content cache.");
        describe_counter!("content_cache_misses_total", "Post bodies fetched and stripped.");
        describe_counter!("summary_cache_hits_total", "Summaries served from the summary cache.");
        describe_counter!("summary_cache_misses_total", "Summaries requested from the LLM.");
        describe_counter!("llm_calls_total", "Chat completion requests sent.");
        describe_counter!("llm_errors_total", "Chat completion requests with a non-2xx status.");
        describe_counter!("listing_errors_total", "Failed newsletter API requests.");
        describe_counter!("fetch_redirects_total", "Redirect hops followed by the fetcher.");
        describe_counter!("aggregate_skipped_total", "Posts or newsletters skipped after an error.");
        describe_gauge!("aggregate_last_run_ts", "Unix ts of the last combined list build.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
