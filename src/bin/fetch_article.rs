//! Fetch one article and print its stripped text (or `--title` for title/subtitle JSON).

use std::time::Duration;

use newsletter_digest::fetch::{normalize_url, Fetcher, DEFAULT_REDIRECT_LIMIT};
use newsletter_digest::title::get_title;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut title_mode = false;
    let mut url = None;
    for arg in std::env::args().skip(1) {
        if arg == "--title" {
            title_mode = true;
        } else {
            url = Some(arg);
        }
    }
    let Some(url) = url else {
        anyhow::bail!("usage: fetch_article [--title] <url>");
    };

    let fetcher = Fetcher::new(Duration::from_secs(10), Duration::from_secs(60))?;
    if title_mode {
        let info = get_title(&fetcher, &url, DEFAULT_REDIRECT_LIMIT).await?;
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        let url = normalize_url(&url)?;
        println!("{}", fetcher.get_article(&url, DEFAULT_REDIRECT_LIMIT).await?);
    }
    Ok(())
}
