// Repository pattern - isolates all database side effects
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::sync::Arc;

use crate::db::models::{
    CoachInfo, Feedback, FeedbackStatus, FeedbackWithCoachInfo, Post, PostWithFeedback, User,
};
use crate::error::{AppError, AppResult, Entity};
use crate::marketplace::domain::{CoinTransfer, CreateFeedbackInput, CreatePostInput, NewUser};
use crate::state::DbPool;

/// Repository trait - all marketplace storage operations
#[async_trait]
pub trait MarketplaceRepository: Send + Sync {
    /// Insert a user with a zero balance. Duplicate username/email is a `Conflict`.
    async fn create_user(&self, user: &NewUser) -> AppResult<User>;

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn create_post(&self, input: &CreatePostInput) -> AppResult<Post>;

    /// Every post with its feedback, both in insertion order
    async fn list_posts(&self) -> AppResult<Vec<PostWithFeedback>>;

    async fn list_posts_by_athlete(&self, athlete_id: i64) -> AppResult<Vec<PostWithFeedback>>;

    /// Insert pending feedback
    async fn create_feedback(&self, input: &CreateFeedbackInput) -> AppResult<Feedback>;

    async fn list_feedback_by_post(&self, post_id: i64) -> AppResult<Vec<FeedbackWithCoachInfo>>;

    /// Atomically mark feedback accepted and move its price from the athlete
    /// to the coach
    async fn accept_feedback(&self, feedback_id: i64, athlete_id: i64) -> AppResult<Feedback>;
}

/// SQLite implementation
pub struct SqliteMarketplaceRepository {
    pool: DbPool,
}

impl SqliteMarketplaceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn user_by_id(conn: &Connection, id: i64) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS);
    Ok(conn.query_row(&sql, params![id], User::from_row).optional()?)
}

fn feedback_by_id(conn: &Connection, id: i64) -> AppResult<Option<Feedback>> {
    let sql = format!("SELECT {} FROM feedback WHERE id = ?1", Feedback::COLUMNS);
    Ok(conn
        .query_row(&sql, params![id], Feedback::from_row)
        .optional()?)
}

fn feedback_for_posts(conn: &Connection, posts: Vec<Post>) -> AppResult<Vec<PostWithFeedback>> {
    let sql = format!(
        "SELECT {} FROM feedback WHERE post_id = ?1 ORDER BY id",
        Feedback::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let mut result = Vec::with_capacity(posts.len());
    for post in posts {
        let feedback = stmt
            .query_map(params![post.id], Feedback::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        result.push(PostWithFeedback::new(post, feedback));
    }
    Ok(result)
}

/// Unique violations name the offending column; turn that into a readable message.
fn describe_user_conflict(err: AppError) -> AppError {
    match err {
        AppError::Conflict(detail) if detail.contains("users.username") => {
            AppError::Conflict("username is already taken".to_string())
        }
        AppError::Conflict(detail) if detail.contains("users.email") => {
            AppError::Conflict("email is already registered".to_string())
        }
        other => other,
    }
}

#[async_trait]
impl MarketplaceRepository for SqliteMarketplaceRepository {
    async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        let conn = self.pool.get()?;

        let sql = format!(
            "INSERT INTO users (username, email, password_hash, role, coins)
             VALUES (?1, ?2, ?3, ?4, 0)
             RETURNING {}",
            User::COLUMNS
        );
        conn.query_row(
            &sql,
            params![user.username, user.email, user.password_hash, user.role],
            User::from_row,
        )
        .map_err(|e| describe_user_conflict(e.into()))
    }

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let conn = self.pool.get()?;
        user_by_id(&conn, id)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let conn = self.pool.get()?;

        let sql = format!("SELECT {} FROM users WHERE email = ?1", User::COLUMNS);
        Ok(conn
            .query_row(&sql, params![email], User::from_row)
            .optional()?)
    }

    async fn create_post(&self, input: &CreatePostInput) -> AppResult<Post> {
        let conn = self.pool.get()?;

        let sql = format!(
            "INSERT INTO posts (athlete_id, video_url, description)
             VALUES (?1, ?2, ?3)
             RETURNING {}",
            Post::COLUMNS
        );
        Ok(conn.query_row(
            &sql,
            params![input.athlete_id, input.video_url, input.description],
            Post::from_row,
        )?)
    }

    async fn list_posts(&self) -> AppResult<Vec<PostWithFeedback>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT p.id, p.athlete_id, p.video_url, p.description, p.created_at,
                    f.id, f.post_id, f.coach_id, f.comment, f.price_coins, f.status, f.created_at
             FROM posts p
             LEFT JOIN feedback f ON f.post_id = p.id
             ORDER BY p.id, f.id",
        )?;

        let rows = stmt.query_map([], |row| {
            let post = Post::from_row(row)?;
            let feedback_id: Option<i64> = row.get(5)?;
            let feedback = match feedback_id {
                Some(_) => Some(Feedback::from_row_at(row, 5)?),
                None => None,
            };
            Ok((post, feedback))
        })?;

        // Rows arrive grouped by post id, so a post starts a new group
        // whenever its id differs from the previous row's
        let mut posts: Vec<PostWithFeedback> = Vec::new();
        for row in rows {
            let (post, feedback) = row?;
            let same_post = posts.last().map(|p| p.id == post.id).unwrap_or(false);
            if !same_post {
                posts.push(PostWithFeedback::new(post, Vec::new()));
            }
            if let (Some(feedback), Some(current)) = (feedback, posts.last_mut()) {
                current.feedback.push(feedback);
            }
        }

        Ok(posts)
    }

    async fn list_posts_by_athlete(&self, athlete_id: i64) -> AppResult<Vec<PostWithFeedback>> {
        let conn = self.pool.get()?;

        let sql = format!(
            "SELECT {} FROM posts WHERE athlete_id = ?1 ORDER BY id",
            Post::COLUMNS
        );
        let posts = {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![athlete_id], Post::from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        feedback_for_posts(&conn, posts)
    }

    async fn create_feedback(&self, input: &CreateFeedbackInput) -> AppResult<Feedback> {
        let conn = self.pool.get()?;

        let sql = format!(
            "INSERT INTO feedback (post_id, coach_id, comment, price_coins, status)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {}",
            Feedback::COLUMNS
        );
        Ok(conn.query_row(
            &sql,
            params![
                input.post_id,
                input.coach_id,
                input.comment,
                input.price_coins,
                FeedbackStatus::Pending
            ],
            Feedback::from_row,
        )?)
    }

    async fn list_feedback_by_post(&self, post_id: i64) -> AppResult<Vec<FeedbackWithCoachInfo>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT f.id, f.post_id, f.coach_id, f.comment, f.price_coins, f.status, f.created_at,
                    u.username, u.email
             FROM feedback f
             JOIN users u ON u.id = f.coach_id
             WHERE f.post_id = ?1
             ORDER BY f.id",
        )?;

        let feedback = stmt
            .query_map(params![post_id], |row| {
                let feedback = Feedback::from_row(row)?;
                let coach = CoachInfo {
                    username: row.get(7)?,
                    email: row.get(8)?,
                };
                Ok(FeedbackWithCoachInfo::new(feedback, coach))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(feedback)
    }

    async fn accept_feedback(&self, feedback_id: i64, athlete_id: i64) -> AppResult<Feedback> {
        // The transaction may wait up to busy_timeout for the write lock
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || accept_in_transaction(&pool, feedback_id, athlete_id))
            .await
            .map_err(|e| AppError::Internal(format!("accept task failed: {}", e)))?
    }
}

fn accept_in_transaction(pool: &DbPool, feedback_id: i64, athlete_id: i64) -> AppResult<Feedback> {
    let mut conn = pool.get()?;

    // IMMEDIATE takes the write lock before the first read, so no other
    // acceptance can interleave between the checks and the updates.
    // Any early return drops the transaction, which rolls it back.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // 1. Feedback exists and 2. is still pending
    let feedback =
        feedback_by_id(&tx, feedback_id)?.ok_or(AppError::NotFound(Entity::Feedback, feedback_id))?;
    CoinTransfer::ensure_pending(&feedback)?;

    // 3. Athlete exists and 4. can pay
    let athlete =
        user_by_id(&tx, athlete_id)?.ok_or(AppError::NotFound(Entity::Athlete, athlete_id))?;
    let transfer = CoinTransfer::plan(&feedback, &athlete)?;

    // 5. Coach exists
    let coach = user_by_id(&tx, feedback.coach_id)?
        .ok_or(AppError::NotFound(Entity::Coach, feedback.coach_id))?;
    transfer.ensure_receivable(&coach)?;

    let sql = format!(
        "UPDATE feedback SET status = ?1 WHERE id = ?2 RETURNING {}",
        Feedback::COLUMNS
    );
    let accepted = tx.query_row(
        &sql,
        params![FeedbackStatus::Accepted, feedback_id],
        Feedback::from_row,
    )?;

    tx.execute(
        "UPDATE users SET coins = coins - ?1 WHERE id = ?2",
        params![transfer.amount, transfer.from_user],
    )?;
    tx.execute(
        "UPDATE users SET coins = coins + ?1 WHERE id = ?2",
        params![transfer.amount, transfer.to_user],
    )?;

    tx.commit()?;

    Ok(accepted)
}

/// Type alias for Arc-wrapped repository (for the service)
pub type DynMarketplaceRepository = Arc<dyn MarketplaceRepository>;
