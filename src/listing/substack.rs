// src/listing/substack.rs
//! Listing collaborator backed by the public Substack JSON API.

use async_trait::async_trait;
use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{NewsletterSource, PostMeta, Recommendation};
use crate::error::{Error, Result};

/// Archive entry. Only `title` and `canonical_url` are required; everything else is
/// optional upstream and validated where it is needed.
#[derive(Debug, Deserialize)]
struct ArchivePost {
    id: Option<IdRepr>,
    title: Option<String>,
    canonical_url: Option<String>,
    post_date: Option<String>,
    slug: Option<String>,
    publication_id: Option<IdRepr>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Num(u64),
    Str(String),
}

impl IdRepr {
    fn into_string(self) -> String {
        match self {
            IdRepr::Num(n) => n.to_string(),
            IdRepr::Str(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostBody {
    body_html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecommendationRow {
    #[serde(rename = "recommendedPublication")]
    recommended_publication: Option<Publication>,
}

#[derive(Debug, Deserialize)]
struct Publication {
    name: Option<String>,
    subdomain: Option<String>,
    custom_domain: Option<String>,
}

impl Publication {
    fn into_recommendation(self) -> Option<Recommendation> {
        let url = match (self.custom_domain, self.subdomain) {
            (Some(d), _) if !d.is_empty() => format!("https://{d}"),
            (_, Some(s)) if !s.is_empty() => format!("https://{s}.substack.com"),
            _ => return None,
        };
        Some(Recommendation {
            name: self.name.unwrap_or_default(),
            url,
        })
    }
}

pub struct SubstackClient {
    http: reqwest::Client,
}

impl SubstackClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn root(newsletter_url: &str) -> &str {
        newsletter_url.trim_end_matches('/')
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(%url, "substack api get");
        let resp = self.http.get(url).send().await.map_err(|e| {
            counter!("listing_errors_total").increment(1);
            Error::fetch(url, e)
        })?;
        let status = resp.status();
        if !status.is_success() {
            counter!("listing_errors_total").increment(1);
            return Err(Error::fetch(url, format!("HTTP {status}")));
        }
        let text = resp.text().await.map_err(|e| Error::fetch(url, e))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::UpstreamShape(format!("{url}: {e}")))
    }

    async fn archive(&self, newsletter_url: &str, limit: usize) -> Result<Vec<ArchivePost>> {
        let url = format!(
            "{}/api/v1/archive?sort=new&offset=0&limit={}",
            Self::root(newsletter_url),
            limit
        );
        self.get_json(&url).await
    }
}

fn to_meta(newsletter_url: &str, p: ArchivePost) -> Result<PostMeta> {
    let title = p
        .title
        .ok_or_else(|| Error::UpstreamShape("archive post without title".into()))?;
    let canonical_url = p
        .canonical_url
        .ok_or_else(|| Error::UpstreamShape(format!("archive post '{title}' without canonical_url")))?;
    Ok(PostMeta {
        id: p.id.map(IdRepr::into_string),
        title,
        canonical_url,
        post_date: p.post_date,
        newsletter_url: newsletter_url.to_string(),
        slug: p.slug,
    })
}

/// Map archive rows to posts. A row missing required fields is skipped on its own
/// so the rest of the newsletter still comes through.
fn archive_to_metas(newsletter_url: &str, posts: Vec<ArchivePost>, limit: usize) -> Vec<PostMeta> {
    posts
        .into_iter()
        .take(limit)
        .filter_map(|p| match to_meta(newsletter_url, p) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(error = %e, newsletter = newsletter_url, "archive entry skipped");
                counter!("aggregate_skipped_total").increment(1);
                None
            }
        })
        .collect()
}

#[async_trait]
impl NewsletterSource for SubstackClient {
    async fn recent_posts(&self, newsletter_url: &str, limit: usize) -> Result<Vec<PostMeta>> {
        let posts = self.archive(newsletter_url, limit).await?;
        Ok(archive_to_metas(newsletter_url, posts, limit))
    }

    async fn post_content(&self, post: &PostMeta) -> Result<String> {
        let slug = post
            .slug
            .as_deref()
            .ok_or_else(|| Error::UpstreamShape(format!("post '{}' has no slug", post.title)))?;
        let url = format!("{}/api/v1/posts/{}", Self::root(&post.newsletter_url), slug);
        let body: PostBody = self.get_json(&url).await?;
        body.body_html
            .ok_or_else(|| Error::UpstreamShape(format!("{url}: missing body_html")))
    }

    async fn recommendations(&self, newsletter_url: &str) -> Result<Vec<Recommendation>> {
        let first = self.archive(newsletter_url, 1).await?.into_iter().next();
        let Some(publication_id) = first.and_then(|p| p.publication_id) else {
            return Err(Error::UpstreamShape(format!(
                "{newsletter_url}: cannot determine publication id"
            )));
        };
        let url = format!(
            "{}/api/v1/recommendations/from/{}",
            Self::root(newsletter_url),
            publication_id.into_string()
        );
        let rows: Vec<RecommendationRow> = self.get_json(&url).await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| r.recommended_publication)
            .filter_map(Publication::into_recommendation)
            .collect())
    }

    fn name(&self) -> &'static str {
        "substack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_json_maps_to_meta() {
        let json = r#"[
            {"id": 187001, "title": "Hello", "canonical_url": "https://a.test/p/hello",
             "post_date": "2026-02-10T08:30:00.000Z", "slug": "hello", "publication_id": 9},
            {"id": "x-2", "title": "Str id", "canonical_url": "https://a.test/p/s"}
        ]"#;
        let rows: Vec<ArchivePost> = serde_json::from_str(json).unwrap();
        let metas: Vec<PostMeta> = rows
            .into_iter()
            .map(|p| to_meta("https://a.test/", p).unwrap())
            .collect();
        assert_eq!(metas[0].id.as_deref(), Some("187001"));
        assert_eq!(metas[0].day(), Some("2026-02-10"));
        assert_eq!(metas[1].id.as_deref(), Some("x-2"));
        assert_eq!(metas[1].post_date, None);
    }

    #[test]
    fn archive_post_without_url_is_shape_error() {
        let rows: Vec<ArchivePost> = serde_json::from_str(r#"[{"id": 1, "title": "t"}]"#).unwrap();
        let err = rows
            .into_iter()
            .map(|p| to_meta("https://a.test/", p))
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamShape(_)));
    }

    #[test]
    fn bad_archive_row_is_skipped_not_fatal() {
        let json = r#"[
            {"id": 1, "slug": "no-title"},
            {"id": 2, "title": "Good", "canonical_url": "https://a.test/p/good",
             "post_date": "2026-02-10T08:30:00.000Z", "slug": "good"},
            {"id": 3, "title": "Past limit", "canonical_url": "https://a.test/p/late"}
        ]"#;
        let rows: Vec<ArchivePost> = serde_json::from_str(json).unwrap();
        let metas = archive_to_metas("https://a.test/", rows, 2);
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].id.as_deref(), Some("2"));
        assert_eq!(metas[0].title, "Good");
    }

    #[test]
    fn recommendation_prefers_custom_domain() {
        let p = Publication {
            name: Some("Next".into()),
            subdomain: Some("next".into()),
            custom_domain: Some("www.next.com".into()),
        };
        assert_eq!(p.into_recommendation().unwrap().url, "https://www.next.com");
        let p = Publication {
            name: None,
            subdomain: Some("next".into()),
            custom_domain: None,
        };
        assert_eq!(p.into_recommendation().unwrap().url, "https://next.substack.com");
        let p = Publication {
            name: Some("x".into()),
            subdomain: None,
            custom_domain: Some(String::new()),
        };
        assert!(p.into_recommendation().is_none());
    }
}
