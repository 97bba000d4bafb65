use async_graphql::*;

use crate::db::models::{Feedback, Post, User};
use crate::marketplace::{
    AcceptFeedbackInput, CreateFeedbackInput, CreatePostInput, LoginInput, Marketplace,
    SignupInput,
};

/// GraphQL Mutation root
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create an account with an empty coin balance
    async fn signup(&self, ctx: &Context<'_>, input: SignupInput) -> Result<User> {
        let market = ctx.data::<Marketplace>()?;
        market.signup(input).await.map_err(|e| e.extend())
    }

    /// Check credentials; null when they do not match an account
    async fn login(&self, ctx: &Context<'_>, input: LoginInput) -> Result<Option<User>> {
        let market = ctx.data::<Marketplace>()?;
        market.login(input).await.map_err(|e| e.extend())
    }

    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<Post> {
        let market = ctx.data::<Marketplace>()?;
        market.create_post(input).await.map_err(|e| e.extend())
    }

    async fn create_feedback(
        &self,
        ctx: &Context<'_>,
        input: CreateFeedbackInput,
    ) -> Result<Feedback> {
        let market = ctx.data::<Marketplace>()?;
        market.create_feedback(input).await.map_err(|e| e.extend())
    }

    /// Accept pending feedback, paying its price from the athlete to the coach
    async fn accept_feedback(
        &self,
        ctx: &Context<'_>,
        input: AcceptFeedbackInput,
    ) -> Result<Feedback> {
        let market = ctx.data::<Marketplace>()?;
        market.accept_feedback(input).await.map_err(|e| e.extend())
    }
}
