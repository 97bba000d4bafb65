use axum::routing::get;
use axum::Router;

use crate::state::AppState;

async fn health() -> &'static str {
    "ok"
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
