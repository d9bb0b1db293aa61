//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.client_origin.as_deref());
    let assets = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .fallback_service(assets)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS policy. Origins are comma-separated; absent or `*` allows any.
fn cors_layer(client_origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods([Method::GET, Method::OPTIONS]);

    let Some(origins) = client_origin.filter(|o| o.trim() != "*") else {
        return base.allow_origin(Any).allow_headers(Any);
    };

    let allowed_origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = s, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(allowed_origins)
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    started_at: DateTime<Utc>,
    connections: usize,
    players: usize,
    missiles: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        started_at: state.started_at,
        connections: state.connections.len(),
        players: state.relay.stats.players(),
        missiles: state.relay.stats.missiles(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::Config;

    fn test_state() -> AppState {
        let config = Config::from_lookup(|key| match key {
            "STATIC_DIR" => Some("does-not-exist".to_string()),
            _ => None,
        })
        .unwrap();
        let (state, _hub) = AppState::new(config);
        state
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let state = test_state();
        let _rx = state.connections.register(Uuid::new_v4());

        let response = build_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["connections"], 1);
        assert_eq!(json["players"], 0);
        assert_eq!(json["missiles"], 0);
        assert!(json["started_at"].is_string());
    }

    #[tokio::test]
    async fn unknown_paths_fall_through_to_static_assets() {
        let response = build_router(test_state())
            .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ws_requires_upgrade() {
        let response = build_router(test_state())
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
