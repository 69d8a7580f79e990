//! REST endpoints for inspecting live sessions.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use super::manager::Orchestrator;

/// Shared state for session routes.
#[derive(Clone)]
pub struct SessionRouteState {
    pub orchestrator: Arc<Orchestrator>,
}

/// GET /api/sessions
///
/// Returns the number of live sessions.
async fn list_sessions(State(state): State<SessionRouteState>) -> impl IntoResponse {
    let active = state.orchestrator.session_count().await;
    Json(serde_json::json!({ "active": active }))
}

/// GET /api/sessions/{id}
///
/// Returns where the session is in the conversation, or 404.
async fn get_session(
    State(state): State<SessionRouteState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.orchestrator.summary(&id).await {
        Some(summary) => Json(serde_json::to_value(summary).unwrap_or_default()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "No such session"})),
        )
            .into_response(),
    }
}

/// Build the session REST routes.
pub fn session_routes(state: SessionRouteState) -> Router {
    Router::new()
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/{id}", get(get_session))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::campaigns::testing::Harness;

    fn router() -> (Router, Arc<Orchestrator>, Harness) {
        let harness = Harness::new();
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&harness.campaigns),
            Duration::from_secs(60),
        ));
        let router = session_routes(SessionRouteState {
            orchestrator: Arc::clone(&orchestrator),
        });
        (router, orchestrator, harness)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn session_summary_and_count() {
        let (router, orchestrator, _harness) = router();
        orchestrator.open("abc").await;
        orchestrator
            .advance("abc", &crate::dialog::Inbound::text("ali"))
            .await;

        let response = router
            .clone()
            .oneshot(Request::get("/api/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["active"], 1);

        let response = router
            .oneshot(Request::get("/api/sessions/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["step"], "get_dob");
        assert_eq!(json["has_profile"], true);
        assert!(json["active_campaign"].is_null());
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let (router, _orchestrator, _harness) = router();
        let response = router
            .oneshot(Request::get("/api/sessions/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
