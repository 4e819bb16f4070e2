//! Axum router wiring.
//!
//! - `POST /api/github` : deployment_status webhooks
//! - `POST /api/jira`   : issue webhooks
//! - ops endpoints (`/metrics`, `/healthz`, `/readyz`)
//!
//! Every webhook request is followed by a snapshot write.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{app_state::AppState, github, jira, ops};

pub fn build_router(state: AppState) -> Router {
    let webhooks = Router::new()
        .route("/api/github", post(github::webhook::deployment_status))
        .route("/api/jira", post(jira::webhook::incident))
        .route_layer(middleware::from_fn_with_state(state.clone(), persist_after));

    Router::new()
        .merge(webhooks)
        .route("/metrics", get(ops::metrics))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn persist_after(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if let Err(e) = state.persist().await {
        tracing::error!(file = %state.snapshot_path().display(), error = %e, "metrics export failed");
    }
    response
}
