use async_graphql::*;

use crate::db::models::{FeedbackWithCoachInfo, PostWithFeedback, User};
use crate::graphql::types::HealthStatus;
use crate::marketplace::Marketplace;

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn healthcheck(&self) -> HealthStatus {
        HealthStatus::ok()
    }

    /// Look up a user; null when no such user exists
    async fn get_user_by_id(&self, ctx: &Context<'_>, user_id: i64) -> Result<Option<User>> {
        let market = ctx.data::<Marketplace>()?;
        market.get_user_by_id(user_id).await.map_err(|e| e.extend())
    }

    /// Every post with its feedback
    async fn get_all_posts(&self, ctx: &Context<'_>) -> Result<Vec<PostWithFeedback>> {
        let market = ctx.data::<Marketplace>()?;
        market.get_all_posts().await.map_err(|e| e.extend())
    }

    /// Posts submitted by one athlete, with their feedback
    async fn get_posts_by_athlete(
        &self,
        ctx: &Context<'_>,
        athlete_id: i64,
    ) -> Result<Vec<PostWithFeedback>> {
        let market = ctx.data::<Marketplace>()?;
        market
            .get_posts_by_athlete(athlete_id)
            .await
            .map_err(|e| e.extend())
    }

    /// Feedback on a post, with the coach's username and email
    async fn get_feedback_by_post(
        &self,
        ctx: &Context<'_>,
        post_id: i64,
    ) -> Result<Vec<FeedbackWithCoachInfo>> {
        let market = ctx.data::<Marketplace>()?;
        market
            .get_feedback_by_post(post_id)
            .await
            .map_err(|e| e.extend())
    }
}
