use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::aggregate::{Aggregator, EnrichedPost};
use crate::cache::{ContentCache, FsStore, Summarizer};
use crate::config::AppConfig;
use crate::error::Error;
use crate::fetch::{normalize_url, Fetcher, USER_AGENT};
use crate::listing::{config::load_newsletters, Recommendation, SubstackClient};
use crate::llm::GroqClient;
use crate::title::{get_title, TitleInfo};

#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<Aggregator>,
    fetcher: Fetcher,
    newsletters_path: PathBuf,
    default_newsletter: String,
    redirect_limit: u32,
}

impl AppState {
    pub fn new(
        aggregator: Arc<Aggregator>,
        fetcher: Fetcher,
        newsletters_path: PathBuf,
        default_newsletter: String,
        redirect_limit: u32,
    ) -> Self {
        Self {
            aggregator,
            fetcher,
            newsletters_path,
            default_newsletter,
            redirect_limit,
        }
    }

    /// Wire the production collaborators: Substack listing, Groq summaries, fs caches.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let connect = Duration::from_secs(cfg.connect_timeout_secs);
        let total = Duration::from_secs(cfg.request_timeout_secs);

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect)
            .timeout(total)
            .build()
            .context("building http client")?;
        let fetcher = Fetcher::new(connect, total).context("building fetcher")?;

        let source = Arc::new(SubstackClient::new(http.clone()));
        let content = ContentCache::new(Arc::new(FsStore::new(&cfg.content_cache_dir, "txt")));
        let llm = Arc::new(GroqClient::new(http, &cfg.llm_base_url, &cfg.api_key, &cfg.model));
        let summarizer = Summarizer::new(Arc::new(FsStore::new(&cfg.summary_cache_dir, "txt")), llm);

        let aggregator = Aggregator::new(source, content, summarizer).with_limits(
            cfg.list_limit,
            cfg.posts_limit,
            cfg.cutoff_days,
        );

        Ok(Self::new(
            Arc::new(aggregator),
            fetcher,
            cfg.newsletters_path.clone(),
            cfg.default_newsletter.clone(),
            cfg.redirect_limit,
        ))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/posts/", post(api_posts))
        .route("/api/list", get(api_list))
        .route("/api/recommendations", get(api_recommendations))
        .route("/api/title", get(api_title))
        .with_state(state)
}

// ------------------------------------------------------------
// Errors
// ------------------------------------------------------------

/// JSON error response: `{"error": "<short description>"}`.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(Error),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Pipeline(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(Error::MissingCredential(_))
            | ApiError::Pipeline(Error::Cache(_))
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match &self {
            ApiError::Pipeline(e) => e.to_string(),
            ApiError::Internal(m) => m.clone(),
        };
        if status.is_server_error() {
            error!(%status, error = %msg, "request failed");
        } else {
            warn!(%status, error = %msg, "request rejected");
        }
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// ------------------------------------------------------------
// Handlers
// ------------------------------------------------------------

#[derive(Deserialize)]
struct PostsForm {
    newsletter_url: Option<String>,
    cut_off: Option<String>,
}

async fn api_posts(
    State(state): State<AppState>,
    Form(form): Form<PostsForm>,
) -> Result<Json<Vec<EnrichedPost>>, ApiError> {
    let raw = non_empty(form.newsletter_url).unwrap_or_else(|| state.default_newsletter.clone());
    let newsletter = normalize_url(&raw)?;
    let cut_off = non_empty(form.cut_off);
    let posts = state
        .aggregator
        .get_posts(&newsletter, cut_off.as_deref())
        .await?;
    Ok(Json(posts))
}

#[derive(Deserialize)]
struct ListQuery {
    cut_off: Option<String>,
}

async fn api_list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<EnrichedPost>>, ApiError> {
    let newsletters = load_newsletters(&state.newsletters_path)
        .map_err(|e| ApiError::Internal(format!("{e:#}")))?;
    let cut_off = non_empty(q.cut_off);
    let posts = state
        .aggregator
        .build_list(&newsletters, cut_off.as_deref())
        .await?;
    Ok(Json(posts))
}

#[derive(Deserialize)]
struct NewsletterQuery {
    newsletter_url: Option<String>,
}

async fn api_recommendations(
    State(state): State<AppState>,
    Query(q): Query<NewsletterQuery>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let raw = non_empty(q.newsletter_url)
        .ok_or_else(|| Error::InvalidInput("newsletter_url is required".into()))?;
    let newsletter = normalize_url(&raw)?;
    Ok(Json(state.aggregator.recommendations(&newsletter).await?))
}

#[derive(Deserialize)]
struct TitleQuery {
    url: Option<String>,
}

async fn api_title(
    State(state): State<AppState>,
    Query(q): Query<TitleQuery>,
) -> Result<Json<TitleInfo>, ApiError> {
    let raw = non_empty(q.url).ok_or_else(|| Error::InvalidInput("url is required".into()))?;
    let info = get_title(&state.fetcher, &raw, state.redirect_limit).await?;
    Ok(Json(info))
}
