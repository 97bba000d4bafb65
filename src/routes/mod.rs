pub mod graphql;
pub mod health;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(graphql::router())
        // The web client is served from a different origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app() -> (Router, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.database.path = Some(temp_dir.path().join("test.db"));
        config.auth.bcrypt_cost = 4;
        let pool = db::create_pool(&config.db_path(), &config.database).unwrap();
        db::run_migrations(&pool).unwrap();
        (app(AppState::new(config, pool)), temp_dir)
    }

    #[tokio::test]
    async fn health_responds_ok() {
        let (app, _temp) = test_app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn graphql_accepts_json_posts() {
        let (app, _temp) = test_app();
        let request = Request::post("/graphql")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query":"{ healthcheck { status } }"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["healthcheck"]["status"], "ok");
    }

    #[tokio::test]
    async fn graphql_rejects_get() {
        let (app, _temp) = test_app();
        let response = app
            .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
