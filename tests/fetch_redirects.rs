// tests/fetch_redirects.rs
//
// Redirect handling against a local axum server (no external network).

mod common;

use std::time::Duration;

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use newsletter_digest::fetch::{Fetcher, DEFAULT_REDIRECT_LIMIT};
use newsletter_digest::title::get_title;
use newsletter_digest::Error;

const PAGE: &str = "<html><head><title>Final &amp; done</title><script>x()</script></head>\
                    <body><p class=\"publication-tagline with-cover\">Tagline</p><p>Arrived</p></body></html>";

/// `/hop/{n}` redirects (relative Location) to `/hop/{n-1}`; `/hop/0` is the page.
async fn hop(Path(n): Path<u32>) -> Response {
    if n == 0 {
        return (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            PAGE,
        )
            .into_response();
    }
    let status = match n % 5 {
        0 => StatusCode::MOVED_PERMANENTLY,
        1 => StatusCode::FOUND,
        2 => StatusCode::SEE_OTHER,
        3 => StatusCode::TEMPORARY_REDIRECT,
        _ => StatusCode::PERMANENT_REDIRECT,
    };
    (status, [(header::LOCATION, format!("../hop/{}", n - 1))]).into_response()
}

async fn test_app() -> String {
    let app = Router::new()
        .route("/hop/{n}", get(hop))
        .route(
            "/absolute",
            get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/hop/0")]) }),
        )
        .route("/loop", get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/loop")]) }))
        .route("/no-location", get(|| async { StatusCode::FOUND }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/plain", get(|| async { "just text, no markup" }))
        .route(
            "/bytes",
            get(|| async { (StatusCode::OK, vec![b'o', b'k', 0xff, b'!']) }),
        );
    common::spawn_server(app).await
}

fn fetcher() -> Fetcher {
    Fetcher::new(Duration::from_secs(5), Duration::from_secs(10)).expect("fetcher")
}

#[tokio::test]
async fn chain_shorter_than_budget_returns_cleaned_page() {
    let base = test_app().await;
    let out = fetcher()
        .get_article(&format!("{base}/hop/9"), DEFAULT_REDIRECT_LIMIT)
        .await
        .expect("9 redirects fit in a budget of 10");
    assert_eq!(out, "Tagline\nArrived");
}

#[tokio::test]
async fn chain_equal_to_or_longer_than_budget_fails() {
    let base = test_app().await;
    for n in [10u32, 14] {
        let err = fetcher()
            .get_article(&format!("{base}/hop/{n}"), DEFAULT_REDIRECT_LIMIT)
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::RedirectLimitExceeded { .. }),
            "{n} redirects: unexpected {err:?}"
        );
    }
}

#[tokio::test]
async fn small_budgets_are_respected() {
    let base = test_app().await;
    let f = fetcher();
    assert!(f.get_article(&format!("{base}/hop/0"), 1).await.is_ok());
    assert!(matches!(
        f.get_article(&format!("{base}/hop/1"), 1).await,
        Err(Error::RedirectLimitExceeded { .. })
    ));
    assert!(f.get_article(&format!("{base}/hop/2"), 3).await.is_ok());
}

#[tokio::test]
async fn redirect_loops_terminate() {
    let base = test_app().await;
    let err = fetcher()
        .get_raw(&format!("{base}/loop"), DEFAULT_REDIRECT_LIMIT)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RedirectLimitExceeded { .. }));
}

#[tokio::test]
async fn absolute_path_location_is_resolved() {
    let base = test_app().await;
    let raw = fetcher()
        .get_raw(&format!("{base}/absolute"), DEFAULT_REDIRECT_LIMIT)
        .await
        .unwrap();
    assert_eq!(raw, PAGE);
}

#[tokio::test]
async fn error_statuses_are_fetch_failures() {
    let base = test_app().await;
    for path in ["/missing", "/no-location"] {
        let err = fetcher()
            .get_raw(&format!("{base}{path}"), DEFAULT_REDIRECT_LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FetchFailure { .. }), "{path}: {err:?}");
    }
}

#[tokio::test]
async fn connection_refused_is_fetch_failure() {
    // Bind and drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = fetcher()
        .get_raw(&format!("http://{addr}/"), DEFAULT_REDIRECT_LIMIT)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FetchFailure { .. }));
}

#[tokio::test]
async fn plain_text_is_returned_as_is_and_bad_bytes_are_replaced() {
    let base = test_app().await;
    let f = fetcher();
    assert_eq!(
        f.get_article(&format!("{base}/plain"), DEFAULT_REDIRECT_LIMIT)
            .await
            .unwrap(),
        "just text, no markup"
    );
    assert_eq!(
        f.get_article(&format!("{base}/bytes"), DEFAULT_REDIRECT_LIMIT)
            .await
            .unwrap(),
        "ok\u{fffd}!"
    );
}

#[tokio::test]
async fn title_lookup_follows_redirects_and_keeps_raw_markup() {
    let base = test_app().await;
    let info = get_title(&fetcher(), &format!("{base}/hop/3"), DEFAULT_REDIRECT_LIMIT)
        .await
        .unwrap();
    assert_eq!(info.title, "Final & done");
    assert_eq!(info.subtitle.as_deref(), Some("Tagline"));
}
