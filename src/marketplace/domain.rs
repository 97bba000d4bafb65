// Domain inputs and rules - pure, no side effects
use async_graphql::InputObject;

use crate::db::models::{Feedback, FeedbackStatus, User, UserRole};
use crate::error::{AppError, AppResult};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 6;

/// Input for creating an account
#[derive(Debug, Clone, InputObject)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

impl SignupInput {
    pub fn validate(&self) -> AppResult<()> {
        let username_len = self.username.trim().chars().count();
        if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&username_len) {
            return Err(AppError::Validation(format!(
                "username must be {}-{} characters",
                USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
            )));
        }
        if !is_valid_email(&self.email) {
            return Err(AppError::Validation(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                PASSWORD_MIN_CHARS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Input for submitting a training video
#[derive(Debug, Clone, InputObject)]
pub struct CreatePostInput {
    pub athlete_id: i64,
    /// Publicly reachable http(s) link to the video
    pub video_url: String,
    pub description: String,
}

impl CreatePostInput {
    pub fn validate(&self) -> AppResult<()> {
        validate_video_url(&self.video_url)?;
        require_text("description", &self.description)
    }
}

/// Input for offering feedback on a post
#[derive(Debug, Clone, InputObject)]
pub struct CreateFeedbackInput {
    pub post_id: i64,
    pub coach_id: i64,
    pub comment: String,
    pub price_coins: i64,
}

impl CreateFeedbackInput {
    pub fn validate(&self) -> AppResult<()> {
        require_text("comment", &self.comment)?;
        if self.price_coins < 0 {
            return Err(AppError::Validation(
                "priceCoins must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct AcceptFeedbackInput {
    pub feedback_id: i64,
    /// The paying athlete
    pub athlete_id: i64,
}

/// A user row ready for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Coin movement decided by an acceptance, applied as relative updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinTransfer {
    pub from_user: i64,
    pub to_user: i64,
    pub amount: i64,
}

impl CoinTransfer {
    /// Feedback must still be pending before anything else is looked at.
    pub fn ensure_pending(feedback: &Feedback) -> AppResult<()> {
        if feedback.status != FeedbackStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "feedback {} is {}, not pending",
                feedback.id, feedback.status
            )));
        }
        Ok(())
    }

    /// Plan the payment of `feedback` by `athlete`. Fails when the athlete
    /// cannot cover the price.
    pub fn plan(feedback: &Feedback, athlete: &User) -> AppResult<Self> {
        if athlete.coins < feedback.price_coins {
            return Err(AppError::InsufficientFunds {
                needed: feedback.price_coins,
                available: athlete.coins,
            });
        }
        Ok(Self {
            from_user: athlete.id,
            to_user: feedback.coach_id,
            amount: feedback.price_coins,
        })
    }

    /// The coach must be able to hold the credited amount.
    pub fn ensure_receivable(&self, coach: &User) -> AppResult<()> {
        coach
            .coins
            .checked_add(self.amount)
            .map(|_| ())
            .ok_or_else(|| AppError::Internal(format!("coin balance overflow for user {}", coach.id)))
    }
}

pub fn ensure_role(user: &User, expected: UserRole) -> AppResult<()> {
    if user.role != expected {
        return Err(AppError::RoleMismatch(format!(
            "user {} is a {}, expected a {}",
            user.id, user.role, expected
        )));
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn validate_video_url(raw: &str) -> AppResult<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| AppError::Validation(format!("invalid video URL: {}", e)))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(()),
        _ => Err(AppError::Validation(format!(
            "video URL must be an http(s) link: {}",
            raw
        ))),
    }
}

/// Syntactic check: `local@domain.tld`, no whitespace, single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}
