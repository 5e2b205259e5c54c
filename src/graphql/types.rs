use async_graphql::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::controllers;
use crate::db::models;

// Helper to parse datetime from database string
fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_optional_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// A registered user. The password hash never leaves the database layer.
#[derive(Clone, Debug, Serialize, Deserialize, SimpleObject)]
pub struct User {
    /// Unique user identifier (UUID)
    pub id: String,

    /// Login name, unique across the site
    pub username: String,

    /// Display name, "u/" + username
    pub prefixed_name: String,

    /// Profile picture reference
    pub profile_pic: Option<String>,

    /// Reputation counter, incremented by domain events
    pub karma: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl From<models::User> for User {
    fn from(user: models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            prefixed_name: user.prefixed_name,
            profile_pic: user.profile_pic,
            karma: user.karma,
            created_at: parse_datetime(user.created_at),
            updated_at: parse_optional_datetime(user.updated_at),
        }
    }
}

/// Signed session token
#[derive(Clone, Debug, Serialize, Deserialize, SimpleObject)]
pub struct Token {
    pub value: String,
}

/// A user plus the session token issued for them (registration and login)
#[derive(Clone, Debug, SimpleObject)]
pub struct UserWithToken {
    #[graphql(flatten)]
    pub user: User,

    pub token: Token,
}

impl From<controllers::users::UserWithToken> for UserWithToken {
    fn from(payload: controllers::users::UserWithToken) -> Self {
        Self {
            user: payload.user.into(),
            token: Token {
                value: payload.token,
            },
        }
    }
}

/// A community
#[derive(Clone, Debug, Serialize, Deserialize, SimpleObject)]
pub struct Community {
    /// Unique community identifier (UUID)
    pub id: String,

    /// Community name, unique across the site
    pub name: String,

    /// Display name, "c/" + name
    pub prefixed_name: String,

    pub description: String,

    /// Icon reference
    pub icon: Option<String>,

    /// The single admin (the creator); immutable after creation
    pub admin_id: String,

    /// Cached member count; tracks the membership relation exactly
    pub members_count: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl From<models::Community> for Community {
    fn from(community: models::Community) -> Self {
        Self {
            id: community.id,
            name: community.name,
            prefixed_name: community.prefixed_name,
            description: community.description,
            icon: community.icon,
            admin_id: community.admin_id,
            members_count: community.members_count,
            created_at: parse_datetime(community.created_at),
            updated_at: parse_optional_datetime(community.updated_at),
        }
    }
}

/// A community with its member set populated
#[derive(Clone, Debug, SimpleObject)]
pub struct CommunityWithMembers {
    #[graphql(flatten)]
    pub community: Community,

    pub members: Vec<User>,
}

impl From<controllers::community::CommunityWithMembers> for CommunityWithMembers {
    fn from(payload: controllers::community::CommunityWithMembers) -> Self {
        Self {
            community: payload.community.into(),
            members: payload.members.into_iter().map(Into::into).collect(),
        }
    }
}

/// A community with its admin populated and the caller's membership resolved
#[derive(Clone, Debug, SimpleObject)]
pub struct CommunityDetails {
    #[graphql(flatten)]
    pub community: Community,

    pub admin: Option<User>,

    /// Whether the requesting user is a member (false for anonymous requests)
    pub joined: bool,
}

impl From<controllers::community::CommunityDetails> for CommunityDetails {
    fn from(payload: controllers::community::CommunityDetails) -> Self {
        Self {
            community: payload.community.into(),
            admin: payload.admin.map(Into::into),
            joined: payload.joined,
        }
    }
}

/// Result of a join/leave operation, scoped to the requesting user
#[derive(Clone, Debug, SimpleObject)]
pub struct MembershipChange {
    #[graphql(flatten)]
    pub community: Community,

    /// Whether the requesting user is a member after the operation
    pub member: bool,
}

impl From<controllers::community::MembershipChange> for MembershipChange {
    fn from(payload: controllers::community::MembershipChange) -> Self {
        Self {
            community: payload.community.into(),
            member: payload.member,
        }
    }
}
