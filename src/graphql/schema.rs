use async_graphql::{EmptySubscription, Schema};

use super::mutations::MutationRoot;
use super::queries::QueryRoot;

/// GraphQL Schema type
pub type MarketSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the GraphQL schema. The `Marketplace` handle is attached per request.
pub fn build_schema() -> MarketSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish()
}
