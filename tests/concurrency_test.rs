//! Concurrent acceptance must never pay twice or overdraw an athlete.

use coachcoin::auth::BcryptCredentials;
use coachcoin::config::DatabaseConfig;
use coachcoin::db;
use coachcoin::db::models::{FeedbackStatus, UserRole};
use coachcoin::error::AppError;
use coachcoin::marketplace::{
    AcceptFeedbackInput, CreateFeedbackInput, CreatePostInput, Marketplace, SignupInput,
    SqliteMarketplaceRepository,
};
use coachcoin::state::DbPool;
use rusqlite::params;
use tempfile::TempDir;

fn setup() -> (Marketplace, DbPool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let pool = db::create_pool(&temp_dir.path().join("test.db"), &DatabaseConfig::default())
        .expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let market = Marketplace::new(
        SqliteMarketplaceRepository::new(pool.clone()),
        BcryptCredentials::new(4),
    );
    (market, pool, temp_dir)
}

async fn signup(market: &Marketplace, name: &str, role: UserRole) -> i64 {
    market
        .signup(SignupInput {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password: "password123".to_string(),
            role,
        })
        .await
        .unwrap()
        .id
}

fn set_coins(pool: &DbPool, user_id: i64, coins: i64) {
    pool.get()
        .unwrap()
        .execute(
            "UPDATE users SET coins = ?1 WHERE id = ?2",
            params![coins, user_id],
        )
        .unwrap();
}

fn coins(pool: &DbPool, user_id: i64) -> i64 {
    pool.get()
        .unwrap()
        .query_row(
            "SELECT coins FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .unwrap()
}

async fn pending_feedback(market: &Marketplace, athlete: i64, coach: i64, price: i64) -> i64 {
    let post = market
        .create_post(CreatePostInput {
            athlete_id: athlete,
            video_url: "https://videos.example.com/race.mp4".to_string(),
            description: "400m splits".to_string(),
        })
        .await
        .unwrap();
    market
        .create_feedback(CreateFeedbackInput {
            post_id: post.id,
            coach_id: coach,
            comment: "Negative split the last 100".to_string(),
            price_coins: price,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_feedback_accepted_at_most_once() {
    let (market, pool, _temp) = setup();
    let athlete = signup(&market, "runner", UserRole::Athlete).await;
    let coach = signup(&market, "trainer", UserRole::Coach).await;
    set_coins(&pool, athlete, 100);
    let feedback = pending_feedback(&market, athlete, coach, 30).await;

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let market = market.clone();
            tokio::spawn(async move {
                market
                    .accept_feedback(AcceptFeedbackInput {
                        feedback_id: feedback,
                        athlete_id: athlete,
                    })
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(f) => {
                assert_eq!(f.status, FeedbackStatus::Accepted);
                accepted += 1;
            }
            Err(AppError::InvalidState(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(accepted, 1, "exactly one acceptance should win");
    assert_eq!(coins(&pool, athlete), 70);
    assert_eq!(coins(&pool, coach), 30);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acceptances_never_overdraw() {
    let (market, pool, _temp) = setup();
    let athlete = signup(&market, "cyclist", UserRole::Athlete).await;
    let coach = signup(&market, "mechanic", UserRole::Coach).await;
    set_coins(&pool, athlete, 50);

    // Balance covers only one of the two
    let first = pending_feedback(&market, athlete, coach, 40).await;
    let second = pending_feedback(&market, athlete, coach, 40).await;

    let tasks: Vec<_> = [first, second]
        .into_iter()
        .map(|feedback_id| {
            let market = market.clone();
            tokio::spawn(async move {
                market
                    .accept_feedback(AcceptFeedbackInput {
                        feedback_id,
                        athlete_id: athlete,
                    })
                    .await
            })
        })
        .collect();

    let mut paid = 0;
    let mut refused = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => paid += 1,
            Err(AppError::InsufficientFunds { .. }) => refused += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!((paid, refused), (1, 1));
    assert_eq!(coins(&pool, athlete), 10);
    assert_eq!(coins(&pool, coach), 40);
}
