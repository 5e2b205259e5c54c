use async_graphql::*;

use crate::auth::SessionContext;
use crate::config::Config;
use crate::controllers;
use crate::graphql::types::{Community, MembershipChange, User, UserWithToken};
use crate::state::DbPool;

/// GraphQL Mutation root
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Register a new user and issue a session token.
    async fn register_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> Result<UserWithToken> {
        let pool = ctx.data::<DbPool>()?;
        let config = ctx.data::<Config>()?;
        controllers::users::register_user(pool, &username, &password, config.jwt_secret())
            .map(Into::into)
            .map_err(|e| e.extend())
    }

    /// Log in with username and password; issues a session token.
    async fn login_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> Result<UserWithToken> {
        let pool = ctx.data::<DbPool>()?;
        let config = ctx.data::<Config>()?;
        controllers::users::login_user(pool, &username, &password, config.jwt_secret())
            .map(Into::into)
            .map_err(|e| e.extend())
    }

    /// Update the current user's profile picture. Requires authentication.
    async fn update_user(&self, ctx: &Context<'_>, profile_pic: String) -> Result<User> {
        let pool = ctx.data::<DbPool>()?;
        let session = ctx.data::<SessionContext>()?;
        controllers::users::update_logged_in_user(pool, &profile_pic, session)
            .map(Into::into)
            .map_err(|e| e.extend())
    }

    /// Create a community with the caller as admin and sole member.
    async fn create_community(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: String,
    ) -> Result<Community> {
        let pool = ctx.data::<DbPool>()?;
        let session = ctx.data::<SessionContext>()?;
        controllers::community::create_community(pool, &name, &description, session)
            .map(Into::into)
            .map_err(|e| e.extend())
    }

    /// Update community metadata. Admin only; omitted fields are retained.
    async fn update_community(
        &self,
        ctx: &Context<'_>,
        community_id: String,
        description: Option<String>,
        icon: Option<String>,
    ) -> Result<Community> {
        let pool = ctx.data::<DbPool>()?;
        let session = ctx.data::<SessionContext>()?;
        controllers::community::update_community(
            pool,
            &community_id,
            description.as_deref(),
            icon.as_deref(),
            session,
        )
        .map(Into::into)
        .map_err(|e| e.extend())
    }

    /// Join a community. Joining twice is a no-op.
    async fn join_community(
        &self,
        ctx: &Context<'_>,
        community_id: String,
    ) -> Result<MembershipChange> {
        let pool = ctx.data::<DbPool>()?;
        let session = ctx.data::<SessionContext>()?;
        controllers::community::join_community(pool, &community_id, session)
            .map(Into::into)
            .map_err(|e| e.extend())
    }

    /// Leave a community. Leaving without membership is a no-op.
    async fn leave_community(
        &self,
        ctx: &Context<'_>,
        community_id: String,
    ) -> Result<MembershipChange> {
        let pool = ctx.data::<DbPool>()?;
        let session = ctx.data::<SessionContext>()?;
        controllers::community::leave_community(pool, &community_id, session)
            .map(Into::into)
            .map_err(|e| e.extend())
    }
}
