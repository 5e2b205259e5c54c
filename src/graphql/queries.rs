use async_graphql::*;

use crate::auth::SessionContext;
use crate::controllers;
use crate::graphql::types::{Community, CommunityDetails, CommunityWithMembers, User};
use crate::state::DbPool;

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All communities with their member sets. Unpaginated.
    async fn communities(&self, ctx: &Context<'_>) -> Result<Vec<CommunityWithMembers>> {
        let pool = ctx.data::<DbPool>()?;
        controllers::community::list_communities(pool)
            .map(|communities| communities.into_iter().map(Into::into).collect())
            .map_err(|e| e.extend())
    }

    /// Search communities by name, most popular first.
    async fn search_communities(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
        page_no: Option<i32>,
        limit: Option<i32>,
    ) -> Result<Vec<Community>> {
        let pool = ctx.data::<DbPool>()?;
        controllers::community::search_communities(
            pool,
            search.as_deref(),
            page_no.map(i64::from),
            limit.map(i64::from),
        )
        .map(|communities| communities.into_iter().map(Into::into).collect())
        .map_err(|e| e.extend())
    }

    /// A single community by its unique name.
    async fn community_details(
        &self,
        ctx: &Context<'_>,
        name: String,
    ) -> Result<CommunityDetails> {
        let pool = ctx.data::<DbPool>()?;
        let session = ctx.data::<SessionContext>()?;
        controllers::community::community_details(pool, &name, session)
            .map(Into::into)
            .map_err(|e| e.extend())
    }

    /// Search users by username. Unbounded.
    async fn users(&self, ctx: &Context<'_>, search: Option<String>) -> Result<Vec<User>> {
        let pool = ctx.data::<DbPool>()?;
        controllers::users::list_users(pool, search.as_deref())
            .map(|users| users.into_iter().map(Into::into).collect())
            .map_err(|e| e.extend())
    }

    /// A single user by their unique username.
    async fn user_details(&self, ctx: &Context<'_>, username: String) -> Result<User> {
        let pool = ctx.data::<DbPool>()?;
        controllers::users::user_details(pool, &username)
            .map(Into::into)
            .map_err(|e| e.extend())
    }

    /// The communities the current user has joined. Requires authentication.
    async fn user_subscriptions(&self, ctx: &Context<'_>) -> Result<Vec<Community>> {
        let pool = ctx.data::<DbPool>()?;
        let session = ctx.data::<SessionContext>()?;
        controllers::users::user_subscriptions(pool, session)
            .map(|communities| communities.into_iter().map(Into::into).collect())
            .map_err(|e| e.extend())
    }
}
