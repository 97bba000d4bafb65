use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::credentials::BcryptCredentials;
use crate::config::Config;
use crate::graphql::{build_schema, MarketSchema};
use crate::marketplace::{Marketplace, SqliteMarketplaceRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub marketplace: Marketplace,
    pub graphql_schema: MarketSchema,
}

impl AppState {
    /// Wire the SQLite store and bcrypt credentials into a marketplace.
    pub fn new(config: Config, pool: DbPool) -> Self {
        let marketplace = Marketplace::new(
            SqliteMarketplaceRepository::new(pool),
            BcryptCredentials::new(config.auth.bcrypt_cost),
        );

        Self {
            config,
            marketplace,
            graphql_schema: build_schema(),
        }
    }
}
