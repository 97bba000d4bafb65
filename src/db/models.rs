use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use std::fmt;
use std::str::FromStr;

/// Account role, fixed at signup.
#[derive(Clone, Copy, Debug, Enum, Eq, PartialEq)]
#[graphql(rename_items = "lowercase")]
pub enum UserRole {
    /// Posts training videos and pays for feedback
    Athlete,

    /// Writes feedback and is paid in coins
    Coach,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Athlete => "athlete",
            UserRole::Coach => "coach",
        }
    }
}

/// Feedback lifecycle. Only `pending -> accepted` is ever performed;
/// `rejected` is kept so stored rows always round-trip.
#[derive(Clone, Copy, Debug, Enum, Eq, PartialEq)]
#[graphql(rename_items = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Accepted => "accepted",
            FeedbackStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "athlete" => Ok(UserRole::Athlete),
            "coach" => Ok(UserRole::Coach),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FeedbackStatus::Pending),
            "accepted" => Ok(FeedbackStatus::Accepted),
            "rejected" => Ok(FeedbackStatus::Rejected),
            other => Err(ParseEnumError {
                kind: "feedback status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Enums are stored as their lowercase text form

impl ToSql for UserRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for UserRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for FeedbackStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for FeedbackStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// A marketplace account
#[derive(Debug, Clone, SimpleObject, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt digest of the account password
    pub password_hash: String,
    pub role: UserRole,
    /// Current coin balance, never negative
    pub coins: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const COLUMNS: &'static str = "id, username, email, password_hash, role, coins, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: row.get(4)?,
            coins: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

/// An athlete's training video submission
#[derive(Debug, Clone, SimpleObject, PartialEq)]
pub struct Post {
    pub id: i64,
    pub athlete_id: i64,
    pub video_url: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub const COLUMNS: &'static str = "id, athlete_id, video_url, description, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            athlete_id: row.get(1)?,
            video_url: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

/// A coach's priced commentary on a post
#[derive(Debug, Clone, SimpleObject, PartialEq)]
pub struct Feedback {
    pub id: i64,
    pub post_id: i64,
    pub coach_id: i64,
    pub comment: String,
    pub price_coins: i64,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub const COLUMNS: &'static str =
        "id, post_id, coach_id, comment, price_coins, status, created_at";

    /// Reads feedback columns starting at `offset`, so joined rows can reuse it.
    pub fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            post_id: row.get(offset + 1)?,
            coach_id: row.get(offset + 2)?,
            comment: row.get(offset + 3)?,
            price_coins: row.get(offset + 4)?,
            status: row.get(offset + 5)?,
            created_at: row.get(offset + 6)?,
        })
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Self::from_row_at(row, 0)
    }
}

/// A post together with all feedback written on it, oldest first
#[derive(Debug, Clone, SimpleObject, PartialEq)]
pub struct PostWithFeedback {
    pub id: i64,
    pub athlete_id: i64,
    pub video_url: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub feedback: Vec<Feedback>,
}

impl PostWithFeedback {
    pub fn new(post: Post, feedback: Vec<Feedback>) -> Self {
        Self {
            id: post.id,
            athlete_id: post.athlete_id,
            video_url: post.video_url,
            description: post.description,
            created_at: post.created_at,
            feedback,
        }
    }
}

#[derive(Debug, Clone, SimpleObject, PartialEq)]
pub struct CoachInfo {
    pub username: String,
    pub email: String,
}

/// Feedback with the public details of the coach who wrote it
#[derive(Debug, Clone, SimpleObject, PartialEq)]
pub struct FeedbackWithCoachInfo {
    pub id: i64,
    pub post_id: i64,
    pub coach_id: i64,
    pub comment: String,
    pub price_coins: i64,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
    pub coach: CoachInfo,
}

impl FeedbackWithCoachInfo {
    pub fn new(feedback: Feedback, coach: CoachInfo) -> Self {
        Self {
            id: feedback.id,
            post_id: feedback.post_id,
            coach_id: feedback.coach_id,
            comment: feedback.comment,
            price_coins: feedback.price_coins,
            status: feedback.status,
            created_at: feedback.created_at,
            coach,
        }
    }
}
