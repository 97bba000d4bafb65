use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};

/// Liveness report for the API
#[derive(Clone, Debug, SimpleObject)]
pub struct HealthStatus {
    /// Always "ok" when the server answers
    pub status: String,

    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
        }
    }
}
