use std::sync::Arc;

use crate::auth::credentials::{CredentialService, DynCredentialService};
use crate::db::models::{Feedback, FeedbackWithCoachInfo, Post, PostWithFeedback, User, UserRole};
use crate::error::{AppError, AppResult};
use crate::marketplace::domain::{
    ensure_role, AcceptFeedbackInput, CreateFeedbackInput, CreatePostInput, LoginInput, NewUser,
    SignupInput,
};
use crate::marketplace::repository::{DynMarketplaceRepository, MarketplaceRepository};

/// The marketplace operations. Cheap to clone; one handle is shared by all
/// requests and carries no state beyond the store and credential service.
#[derive(Clone)]
pub struct Marketplace {
    repo: DynMarketplaceRepository,
    credentials: DynCredentialService,
}

impl Marketplace {
    pub fn new(
        repo: impl MarketplaceRepository + 'static,
        credentials: impl CredentialService + 'static,
    ) -> Self {
        Self {
            repo: Arc::new(repo),
            credentials: Arc::new(credentials),
        }
    }

    pub async fn signup(&self, input: SignupInput) -> AppResult<User> {
        input.validate()?;

        let credentials = Arc::clone(&self.credentials);
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || credentials.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))??;

        let new_user = NewUser {
            username: input.username.trim().to_string(),
            email: input.email,
            password_hash,
            role: input.role,
        };

        let user = self.repo.create_user(&new_user).await.map_err(|e| {
            tracing::debug!("Signup rejected for {}: {}", new_user.username, e);
            e
        })?;
        tracing::info!("User {} signed up as {}", user.id, user.role);
        Ok(user)
    }

    /// `None` for an unknown email or a wrong password; never an error for bad credentials.
    pub async fn login(&self, input: LoginInput) -> AppResult<Option<User>> {
        let Some(user) = self.repo.find_user_by_email(&input.email).await? else {
            tracing::debug!("Login failed: unknown email");
            return Ok(None);
        };

        let credentials = Arc::clone(&self.credentials);
        let digest = user.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || credentials.verify(&input.password, &digest))
                .await
                .map_err(|e| AppError::Internal(format!("password check task failed: {}", e)))?;
        if !verified {
            tracing::debug!("Login failed: wrong password for user {}", user.id);
            return Ok(None);
        }

        tracing::info!("User {} logged in", user.id);
        Ok(Some(user))
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> AppResult<Option<User>> {
        self.repo.find_user_by_id(user_id).await
    }

    pub async fn create_post(&self, input: CreatePostInput) -> AppResult<Post> {
        input.validate()?;
        self.require_user(input.athlete_id, UserRole::Athlete).await?;

        let post = self.repo.create_post(&input).await?;
        tracing::info!("Athlete {} created post {}", post.athlete_id, post.id);
        Ok(post)
    }

    pub async fn get_all_posts(&self) -> AppResult<Vec<PostWithFeedback>> {
        self.repo.list_posts().await
    }

    pub async fn get_posts_by_athlete(&self, athlete_id: i64) -> AppResult<Vec<PostWithFeedback>> {
        self.repo.list_posts_by_athlete(athlete_id).await
    }

    pub async fn create_feedback(&self, input: CreateFeedbackInput) -> AppResult<Feedback> {
        input.validate()?;
        self.require_user(input.coach_id, UserRole::Coach).await?;

        let feedback = self.repo.create_feedback(&input).await?;
        tracing::info!(
            "Coach {} offered feedback {} on post {} for {} coins",
            feedback.coach_id,
            feedback.id,
            feedback.post_id,
            feedback.price_coins
        );
        Ok(feedback)
    }

    pub async fn get_feedback_by_post(&self, post_id: i64) -> AppResult<Vec<FeedbackWithCoachInfo>> {
        self.repo.list_feedback_by_post(post_id).await
    }

    pub async fn accept_feedback(&self, input: AcceptFeedbackInput) -> AppResult<Feedback> {
        match self
            .repo
            .accept_feedback(input.feedback_id, input.athlete_id)
            .await
        {
            Ok(feedback) => {
                tracing::info!(
                    "Athlete {} accepted feedback {}; {} coins paid to coach {}",
                    input.athlete_id,
                    feedback.id,
                    feedback.price_coins,
                    feedback.coach_id
                );
                Ok(feedback)
            }
            Err(e) => {
                tracing::warn!(
                    "Accepting feedback {} for athlete {} failed: {}",
                    input.feedback_id,
                    input.athlete_id,
                    e
                );
                Err(e)
            }
        }
    }

    /// Referenced users must exist and hold the expected role.
    async fn require_user(&self, user_id: i64, role: UserRole) -> AppResult<User> {
        let user = self.repo.find_user_by_id(user_id).await?.ok_or_else(|| {
            AppError::ForeignKeyViolation(format!("{} {} does not exist", role, user_id))
        })?;
        ensure_role(&user, role)?;
        Ok(user)
    }
}
