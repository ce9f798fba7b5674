// src/error.rs
//! Error taxonomy of the content pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("too many redirects while fetching {url}")]
    RedirectLimitExceeded { url: String },

    #[error("fetch failed for {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("unexpected upstream response: {0}")]
    UpstreamShape(String),

    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("model response is not a {{short, full}} JSON object: {0}")]
    MalformedModelResponse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cache I/O error: {0}")]
    Cache(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::FetchFailure {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Configuration problems abort a whole aggregation instead of skipping a post.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MissingCredential(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        Error::FetchFailure {
            url,
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_credential_is_fatal() {
        assert!(Error::MissingCredential("GROQ_API_KEY").is_fatal());
        assert!(!Error::fetch("https://x.test", "boom").is_fatal());
        assert!(!Error::MalformedModelResponse("nope".into()).is_fatal());
    }

    #[test]
    fn messages_are_short() {
        let e = Error::RedirectLimitExceeded {
            url: "https://a.test/".into(),
        };
        assert_eq!(e.to_string(), "too many redirects while fetching https://a.test/");
        assert_eq!(
            Error::MissingCredential("GROQ_API_KEY").to_string(),
            "GROQ_API_KEY is not set"
        );
    }
}
