// Library exports for coachcoin
// This allows integration tests and external code to use coachcoin modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod marketplace;
pub mod routes;
pub mod state;
