pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{
    AcceptFeedbackInput, CoinTransfer, CreateFeedbackInput, CreatePostInput, LoginInput,
    SignupInput,
};
pub use repository::{MarketplaceRepository, SqliteMarketplaceRepository};
pub use service::Marketplace;
