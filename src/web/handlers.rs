//! HTTP request handlers.

use super::AppState;
use crate::chart::{build_chart, RangeSelector};
use crate::source::SourceError;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

// ============================================================================
// API: Latency chart
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LatencyQuery {
    #[serde(default)]
    pub range: Option<String>,
}

pub async fn handle_get_latency(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LatencyQuery>,
) -> impl IntoResponse {
    let range = match query.range.as_deref().map(str::trim) {
        None | Some("") => state.config.default_range,
        Some(s) => match s.parse::<RangeSelector>() {
            Ok(r) => r,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        },
    };

    let now = state.clock.now();
    let start = now - range.policy().lookback();

    let source = state.source.clone();
    let monitor_id = id.clone();
    // On timeout the blocking read is detached, not cancelled; it finishes and
    // releases the store lock on its own, and later reads wait behind it.
    let fetch = tokio::task::spawn_blocking(move || source.fetch_probes(&monitor_id, start, now));

    let probes = match tokio::time::timeout(state.config.fetch_timeout, fetch).await {
        Ok(Ok(Ok(probes))) => probes,
        Ok(Ok(Err(SourceError::UnknownMonitor(_)))) => {
            return (StatusCode::NOT_FOUND, "Monitor not found").into_response();
        }
        Ok(Ok(Err(e))) => {
            tracing::error!("Failed to fetch probes for {}: {}", id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
        Ok(Err(e)) => {
            tracing::error!("Probe fetch task for {} failed: {}", id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Probe fetch failed").into_response();
        }
        Err(_) => {
            tracing::warn!(
                "Probe fetch for {} timed out after {:?}",
                id,
                state.config.fetch_timeout
            );
            return (StatusCode::GATEWAY_TIMEOUT, "Probe fetch timed out").into_response();
        }
    };

    Json(build_chart(&probes, range, now)).into_response()
}

// ============================================================================
// API: Ranges
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRange {
    pub range: RangeSelector,
    pub step_seconds: i64,
    pub lookback_seconds: i64,
    pub bucket_count: usize,
}

pub async fn handle_get_ranges() -> impl IntoResponse {
    let ranges: Vec<ApiRange> = RangeSelector::ALL
        .into_iter()
        .map(|range| {
            let policy = range.policy();
            ApiRange {
                range,
                step_seconds: policy.step().num_seconds(),
                lookback_seconds: policy.lookback().num_seconds(),
                bucket_count: policy.bucket_count(),
            }
        })
        .collect();

    Json(ranges)
}

#[cfg(test)]
mod tests {
    use crate::chart::ProbeRecord;
    use crate::clock::FixedClock;
    use crate::config::ServerConfig;
    use crate::db::{Monitor, Store};
    use crate::source::{ProbeSource, SourceError};
    use crate::web::Server;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 4, 18, 0, 0).unwrap()
    }

    fn app_with(source: Arc<dyn ProbeSource>, config: ServerConfig) -> Router {
        Server::new(config, source, Arc::new(FixedClock(now()))).routes()
    }

    fn store_app() -> (NamedTempFile, Router) {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        store
            .add_monitor(&Monitor {
                id: "m-web".to_string(),
                name: "Web".to_string(),
                url: "https://example.com".to_string(),
            })
            .unwrap();
        store
            .add_probe_records(
                "m-web",
                &[
                    ProbeRecord::success(now() - ChronoDuration::minutes(50), 80.0),
                    ProbeRecord::failure(now() - ChronoDuration::minutes(10)),
                    ProbeRecord::failure(now() - ChronoDuration::minutes(9)),
                    ProbeRecord::success(now() - ChronoDuration::hours(5), 300.0),
                ],
            )
            .unwrap();
        (tmp, app_with(Arc::new(store), ServerConfig::default()))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_latency_default_range() {
        let (_tmp, app) = store_app();
        let (status, body) = get(app, "/api/monitors/m-web/latency").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["range"], "1h");
        let buckets = json["buckets"].as_array().unwrap();
        assert_eq!(buckets.len(), 61);
        assert_eq!(buckets[10]["latencyMs"], 80);
        assert_eq!(buckets[50]["failed"], true);
        assert_eq!(buckets[51]["failed"], true);

        let zones = json["zones"].as_array().unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0]["start"], (now() - ChronoDuration::minutes(10)).timestamp_millis());
        assert_eq!(zones[0]["end"], (now() - ChronoDuration::minutes(9)).timestamp_millis());
    }

    #[tokio::test]
    async fn test_latency_day_range() {
        let (_tmp, app) = store_app();
        let (status, body) = get(app, "/api/monitors/m-web/latency?range=24h").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let buckets = json["buckets"].as_array().unwrap();
        assert_eq!(buckets.len(), 25);
        assert_eq!(buckets[19]["latencyMs"], 300);
        // Success at -50m and failures at -10m share the last full hour.
        assert_eq!(buckets[23]["latencyMs"], 80);
        assert!(json["zones"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latency_invalid_range() {
        let (_tmp, app) = store_app();
        let (status, _) = get(app, "/api/monitors/m-web/latency?range=2w").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_latency_unknown_monitor() {
        let (_tmp, app) = store_app();
        let (status, _) = get(app, "/api/monitors/m-nope/latency?range=1h").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    struct SlowSource;

    impl ProbeSource for SlowSource {
        fn fetch_probes(
            &self,
            _monitor_id: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<ProbeRecord>, SourceError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_latency_fetch_timeout() {
        let config = ServerConfig {
            fetch_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let app = app_with(Arc::new(SlowSource), config);
        let (status, _) = get(app, "/api/monitors/m-slow/latency").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    struct BrokenSource;

    impl ProbeSource for BrokenSource {
        fn fetch_probes(
            &self,
            _monitor_id: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<ProbeRecord>, SourceError> {
            Err(SourceError::Store(crate::db::DbError::LockPoisoned))
        }
    }

    #[tokio::test]
    async fn test_latency_store_error() {
        let app = app_with(Arc::new(BrokenSource), ServerConfig::default());
        let (status, _) = get(app, "/api/monitors/m-any/latency").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_ranges_table() {
        let app = app_with(Arc::new(BrokenSource), ServerConfig::default());
        let (status, body) = get(app, "/api/ranges").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json[0],
            serde_json::json!({ "range": "1h", "stepSeconds": 60, "lookbackSeconds": 3600, "bucketCount": 61 })
        );
        assert_eq!(json[3]["range"], "30d");
        assert_eq!(json[3]["bucketCount"], 721);
    }
}
