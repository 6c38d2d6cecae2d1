use axum::{
    Router,
    routing::{any, get},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, incoming_call};
use crate::state::AppState;
use std::sync::Arc;

/// Create the HTTP router: health, status and the Twilio voice webhook
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/api/status", get(api::api_status))
        // Twilio may be configured to use GET or POST
        .route("/incoming-call", any(incoming_call::incoming_call))
        .layer(TraceLayer::new_for_http())
}
