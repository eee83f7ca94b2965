//! The CRUD surface shared by the content repositories.
//!
//! A repository borrows a connection (or a transaction, which derefs to one) for as long as it
//! lives, so callers decide the transaction boundary. Recipes, articles, features, FAQs and users
//! implement it; settings and payments have key-shaped access and keep inherent methods instead.

use std::collections::HashMap;

use crate::db::errors::Result;

#[async_trait::async_trait]
pub trait Repository {
    /// Validated insert payload, built by the API layer
    type CreateRequest;
    /// Partial update; `None` fields keep their stored value
    type UpdateRequest;
    type Response;
    type Id: Send + Sync;
    /// Status and paging filter for `list` and `count`
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// Fetch many rows at once, keyed by id. Ids with no row are simply absent from the map,
    /// which is how features and articles drop references to deleted recipes.
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>>;

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Rows matching the filter, ignoring its skip and limit
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64>;

    /// Fails with `DbError::NotFound` for unknown ids.
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;

    /// `Ok(false)` when there was nothing to delete.
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;
}
