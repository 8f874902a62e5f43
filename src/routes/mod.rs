pub mod health;
pub mod menu;
pub mod metrics;
pub mod servings;
pub mod users;

use std::future::Future;
use std::time::Duration;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

/// Run `fut` under the request deadline. On expiry the future is dropped, which
/// cancels any upstream requests it still had in flight.
pub(crate) async fn with_deadline<F: Future>(
    deadline: Duration,
    fut: F,
) -> Result<F::Output, (StatusCode, Json<Value>)> {
    tokio::time::timeout(deadline, fut).await.map_err(|_| {
        tracing::warn!("Request abandoned after {:?}", deadline);
        (
            StatusCode::GATEWAY_TIMEOUT,
            Json(json!({ "error": "The cafeteria took too long to answer" })),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Router,
    };
    use tower::ServiceExt;

    use super::users::split_codes;
    use super::*;
    use crate::config::{Config, UpstreamConfig};
    use crate::services::fetcher::fake::FakeFetcher;
    use crate::services::users::tests::account_payload;
    use crate::{app, AppState};

    fn router(fetcher: FakeFetcher) -> Router {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            upstream: UpstreamConfig::default(),
            request_timeout: Duration::from_secs(5),
        };
        app(AppState::new(config, Arc::new(fetcher)))
    }

    async fn get_text(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
        let (status, text) = get_text(router, uri).await;
        (status, serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    #[test]
    fn test_split_codes() {
        let codes: Vec<String> = split_codes(" B,A,,B , ").into_iter().collect();
        assert_eq!(codes, vec!["A".to_string(), "B".to_string()]);
        assert!(split_codes("").is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(router(FakeFetcher::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_users_partial() {
        let fetcher = FakeFetcher::new()
            .respond("accion=4&codigo=B", 200, &account_payload("Bea", "Diaz", 80));

        let (status, body) = get(router(fetcher), "/users?codes=A,B").await;

        assert_eq!(status, StatusCode::OK);
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["code"], "B");
        assert_eq!(users[0]["name"], "Bea Diaz");
        assert_eq!(users[0]["balance"], 80);
        assert_eq!(users[0]["expirationDate"], "2024-12-31T00:00:00Z");
        assert_eq!(users[0]["imageURL"], "https://asiruws.unc.edu.ar/foto/img123");
    }

    #[tokio::test]
    async fn test_users_empty_codes() {
        let fetcher = FakeFetcher::new();
        let (status, body) = get(router(fetcher), "/users?codes=").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_users_missing_codes() {
        let (status, body) = get(router(FakeFetcher::new()), "/users").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_users_invalid_code_is_bad_request() {
        let fetcher = Arc::new(FakeFetcher::new());
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            upstream: UpstreamConfig::default(),
            request_timeout: Duration::from_secs(5),
        };
        let router = app(AppState::new(config, fetcher.clone()));

        let (status, body) = get(router, "/users?codes=A,a%26accion%3D1").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("a&accion=1"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_metrics_count_failed_accounts() {
        let router = router(FakeFetcher::new());

        let (status, _) = get(router.clone(), "/users?codes=A").await;
        assert_eq!(status, StatusCode::OK);

        let (status, text) = get_text(router, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains(r#"uncmorfi_user_fetch_failures_total{reason="transport"}"#), "{text}");
    }

    #[tokio::test]
    async fn test_metrics_count_menu_parse_failures() {
        let upstream = UpstreamConfig::default();
        let fetcher = FakeFetcher::new().respond(&upstream.menu_url, 200, "<html></html>");
        let router = router(fetcher);

        let (status, _) = get(router.clone(), "/menu").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, text) = get_text(router, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            text.lines().any(|line| line.starts_with("uncmorfi_parse_failures_total{")
                && line.contains(r#"view="menu""#)
                && line.contains(r#"reason="unparseable""#)),
            "{text}"
        );
    }

    #[tokio::test]
    async fn test_menu() {
        let upstream = UpstreamConfig::default();
        let fetcher = FakeFetcher::new().respond(
            &upstream.menu_url,
            200,
            r#"<div class="field-item even"><ul><li>Rice</li><li>Salad</li></ul><ul><li>Pasta</li></ul></div>"#,
        );

        let (status, body) = get(router(fetcher), "/menu").await;

        assert_eq!(status, StatusCode::OK);
        let days = body.as_object().unwrap();
        assert_eq!(days.len(), 2);
        let mut lists: Vec<&Value> = days.values().collect();
        lists.sort_by_key(|v| v.as_array().map(Vec::len));
        assert_eq!(lists, vec![&json!(["Pasta"]), &json!(["Rice", "Salad"])]);
        assert!(days.keys().all(|k| k.ends_with("T00:00:00Z")));
    }

    #[tokio::test]
    async fn test_menu_unparseable_is_bad_gateway() {
        let upstream = UpstreamConfig::default();
        let fetcher = FakeFetcher::new().respond(&upstream.menu_url, 200, "<html><p>Sin menú</p></html>");

        let (status, body) = get(router(fetcher), "/menu").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_servings() {
        let upstream = UpstreamConfig::default();
        let fetcher = FakeFetcher::new().respond(
            &upstream.servings_url,
            200,
            "foo({table:{cols:[],rows:[{c:[{v:'12:09:00'},{v:45}]}]}})",
        );

        let (status, body) = get(router(fetcher), "/servings").await;

        assert_eq!(status, StatusCode::OK);
        let slots = body.as_object().unwrap();
        assert_eq!(slots.len(), 1);
        let (key, count) = slots.iter().next().unwrap();
        // 12:09 at UTC-3
        assert!(key.ends_with("T15:09:00Z"), "{key}");
        assert_eq!(count, &json!(45));
    }

    #[tokio::test]
    async fn test_servings_timeout() {
        let upstream = UpstreamConfig::default();
        let fetcher = FakeFetcher::new().fail(
            &upstream.servings_url,
            crate::error::TransportError::Timeout,
        );

        let (status, _) = get(router(fetcher), "/servings").await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapses() {
        let result = with_deadline(
            Duration::from_secs(1),
            tokio::time::sleep(Duration::from_secs(10)),
        )
        .await;

        assert_eq!(result.unwrap_err().0, StatusCode::GATEWAY_TIMEOUT);
    }
}
