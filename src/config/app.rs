// src/config/app.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::{info, warn};

use crate::llm::{API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";
pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";

pub const ENV_MODEL: &str = "DIGEST_MODEL";
pub const ENV_NEWSLETTERS_PATH: &str = "DIGEST_NEWSLETTERS_PATH";
pub const ENV_CONTENT_CACHE_DIR: &str = "DIGEST_CONTENT_CACHE_DIR";
pub const ENV_SUMMARY_CACHE_DIR: &str = "DIGEST_SUMMARY_CACHE_DIR";
pub const ENV_DEFAULT_NEWSLETTER: &str = "DIGEST_DEFAULT_NEWSLETTER";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// "ENV" means: read from GROQ_API_KEY. Empty disables summarization.
    pub api_key: String,
    pub model: String,
    pub llm_base_url: String,
    pub newsletters_path: PathBuf,
    pub content_cache_dir: PathBuf,
    pub summary_cache_dir: PathBuf,
    /// Used by `POST /api/posts/` when no newsletter_url is given.
    pub default_newsletter: String,
    /// Posts requested per newsletter when building the combined list.
    pub list_limit: usize,
    /// Posts requested for the single-newsletter listing.
    pub posts_limit: usize,
    pub cutoff_days: i64,
    pub redirect_limit: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: "ENV".to_string(),
            model: DEFAULT_MODEL.to_string(),
            llm_base_url: DEFAULT_BASE_URL.to_string(),
            newsletters_path: PathBuf::from("newsletters.txt"),
            content_cache_dir: PathBuf::from("content_cache"),
            summary_cache_dir: PathBuf::from("cache"),
            default_newsletter: "https://illai.substack.com/".to_string(),
            list_limit: 7,
            posts_limit: 5,
            cutoff_days: 10,
            redirect_limit: 10,
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load from `$DIGEST_CONFIG_PATH`, else `config/digest.toml` if it exists, else
    /// defaults; then apply env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(&p)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::load_from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };
        cfg.apply_env();
        cfg.finish();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        info!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = env::var(ENV_MODEL) {
            self.model = v;
        }
        if let Ok(v) = env::var(ENV_NEWSLETTERS_PATH) {
            self.newsletters_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_CONTENT_CACHE_DIR) {
            self.content_cache_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_SUMMARY_CACHE_DIR) {
            self.summary_cache_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_DEFAULT_NEWSLETTER) {
            self.default_newsletter = v;
        }
    }

    /// Resolve the API key and clamp numeric knobs into usable ranges.
    fn finish(&mut self) {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(API_KEY_ENV).unwrap_or_default();
        }
        if self.api_key.trim().is_empty() {
            warn!("{API_KEY_ENV} is not set; summarization requests will fail");
        }

        self.list_limit = self.list_limit.clamp(1, 50);
        self.posts_limit = self.posts_limit.clamp(1, 50);
        if self.cutoff_days < 0 {
            self.cutoff_days = 0;
        }
        if self.redirect_limit == 0 {
            self.redirect_limit = 10;
        }
    }
}
