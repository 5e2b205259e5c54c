use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::auth::SessionContext;
use crate::controllers::PAGINATION_LIMIT;
use crate::db::models::{Community, User};
use crate::error::{translate_db_error, ApiError, ApiResult};
use crate::state::DbPool;
use crate::validations::community::{
    validate_create_community_details, validate_get_community_details_args,
    validate_join_community_args, validate_leave_community_args, validate_update_community_args,
};

/// Karma awarded to the creator of a new community.
const COMMUNITY_CREATION_KARMA: i64 = 10;

const COMMUNITY_COLUMNS: &str =
    "id, name, prefixed_name, description, icon, admin_id, members_count, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, username, prefixed_name, password_hash, profile_pic, karma, created_at, updated_at";

pub struct CommunityWithMembers {
    pub community: Community,
    pub members: Vec<User>,
}

pub struct CommunityDetails {
    pub community: Community,
    pub admin: Option<User>,
    /// Whether the requesting user is among the members. Always false for
    /// anonymous requests.
    pub joined: bool,
}

pub struct MembershipChange {
    pub community: Community,
    /// Whether the requesting user is a member after the operation.
    pub member: bool,
}

fn community_from_row(row: &Row) -> rusqlite::Result<Community> {
    Ok(Community {
        id: row.get(0)?,
        name: row.get(1)?,
        prefixed_name: row.get(2)?,
        description: row.get(3)?,
        icon: row.get(4)?,
        admin_id: row.get(5)?,
        members_count: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        prefixed_name: row.get(2)?,
        password_hash: row.get(3)?,
        profile_pic: row.get(4)?,
        karma: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn find_community(conn: &Connection, community_id: &str) -> ApiResult<Community> {
    conn.query_row(
        &format!("SELECT {COMMUNITY_COLUMNS} FROM communities WHERE id = ?1"),
        params![community_id],
        community_from_row,
    )
    .optional()
    .map_err(translate_db_error)?
    .ok_or(ApiError::NotFound("Community"))
}

fn is_member(conn: &Connection, community_id: &str, user_id: &str) -> ApiResult<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM community_members WHERE community_id = ?1 AND user_id = ?2",
        params![community_id, user_id],
        |row| row.get(0),
    )
    .map_err(translate_db_error)
}

/// All communities with their member sets populated. Unpaginated.
pub fn list_communities(pool: &DbPool) -> ApiResult<Vec<CommunityWithMembers>> {
    let conn = pool.get()?;

    let communities: Vec<Community> = {
        let mut stmt = conn
            .prepare(&format!("SELECT {COMMUNITY_COLUMNS} FROM communities"))
            .map_err(translate_db_error)?;
        let rows = stmt
            .query_map([], community_from_row)
            .map_err(translate_db_error)?;
        rows.filter_map(|r| r.ok()).collect()
    };

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users u
             JOIN community_members m ON m.user_id = u.id
             WHERE m.community_id = ?1"
        ))
        .map_err(translate_db_error)?;

    let mut result = Vec::with_capacity(communities.len());
    for community in communities {
        let members: Vec<User> = stmt
            .query_map(params![community.id], user_from_row)
            .map_err(translate_db_error)?
            .filter_map(|r| r.ok())
            .collect();
        result.push(CommunityWithMembers { community, members });
    }
    Ok(result)
}

/// Case-insensitive substring search over community names, most popular
/// first. Ties fall to storage order.
pub fn search_communities(
    pool: &DbPool,
    search: Option<&str>,
    page_no: Option<i64>,
    limit: Option<i64>,
) -> ApiResult<Vec<Community>> {
    let conn = pool.get()?;
    let search = search.unwrap_or("");
    let limit = limit.unwrap_or(PAGINATION_LIMIT);
    let offset = page_no.unwrap_or(0) * limit;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities
             WHERE lower(name) LIKE '%' || lower(?1) || '%'
             ORDER BY members_count DESC
             LIMIT ?2 OFFSET ?3"
        ))
        .map_err(translate_db_error)?;

    let communities = stmt
        .query_map(params![search, limit, offset], community_from_row)
        .map_err(translate_db_error)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(communities)
}

/// Fetch a community by its unique name, with the admin populated and, when a
/// current user exists, whether that user is among the members.
pub fn community_details(
    pool: &DbPool,
    name: &str,
    session: &SessionContext,
) -> ApiResult<CommunityDetails> {
    validate_get_community_details_args(name)?;

    let conn = pool.get()?;
    let community = conn
        .query_row(
            &format!("SELECT {COMMUNITY_COLUMNS} FROM communities WHERE name = ?1"),
            params![name],
            community_from_row,
        )
        .optional()
        .map_err(translate_db_error)?
        .ok_or(ApiError::NotFound("Community"))?;

    let admin = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![community.admin_id],
            user_from_row,
        )
        .optional()
        .map_err(translate_db_error)?;

    let joined = match &session.current_user {
        Some(user) => is_member(&conn, &community.id, &user.id)?,
        None => false,
    };

    Ok(CommunityDetails {
        community,
        admin,
        joined,
    })
}

/// Create a community with the caller as admin and sole member, then award
/// creation karma. Both writes commit in one transaction.
pub fn create_community(
    pool: &DbPool,
    name: &str,
    description: &str,
    session: &SessionContext,
) -> ApiResult<Community> {
    let user = session.require_user()?;
    validate_create_community_details(name, description)?;

    let mut conn = pool.get()?;
    let tx = conn.transaction().map_err(translate_db_error)?;

    let id = uuid::Uuid::now_v7().to_string();
    let now = Utc::now().to_rfc3339();

    tx.execute(
        "INSERT INTO communities (id, name, prefixed_name, description, admin_id, members_count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
        params![id, name, format!("c/{}", name), description, user.id, now],
    )
    .map_err(translate_db_error)?;

    tx.execute(
        "INSERT INTO community_members (community_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
        params![id, user.id, now],
    )
    .map_err(translate_db_error)?;

    // Arithmetic stays in the storage layer; never read-modify-write counters
    // in application code.
    tx.execute(
        "UPDATE users SET karma = karma + ?1 WHERE id = ?2",
        params![COMMUNITY_CREATION_KARMA, user.id],
    )
    .map_err(translate_db_error)?;

    let community = tx
        .query_row(
            &format!("SELECT {COMMUNITY_COLUMNS} FROM communities WHERE id = ?1"),
            params![id],
            community_from_row,
        )
        .map_err(translate_db_error)?;

    tx.commit().map_err(translate_db_error)?;
    Ok(community)
}

/// Admin-only metadata update. Omitted fields keep their existing values.
pub fn update_community(
    pool: &DbPool,
    community_id: &str,
    description: Option<&str>,
    icon: Option<&str>,
    session: &SessionContext,
) -> ApiResult<Community> {
    let user = session.require_user()?;
    validate_update_community_args(community_id)?;

    let conn = pool.get()?;
    let community = find_community(&conn, community_id)?;

    if community.admin_id != user.id {
        return Err(ApiError::Forbidden);
    }

    let description = description.unwrap_or(&community.description);
    let icon = icon.or(community.icon.as_deref());
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "UPDATE communities SET description = ?1, icon = ?2, updated_at = ?3 WHERE id = ?4",
        params![description, icon, now, community_id],
    )
    .map_err(translate_db_error)?;

    find_community(&conn, community_id)
}

/// Add the caller to the member set. Joining a community the caller already
/// belongs to is a no-op: the counter only moves when the membership edge is
/// actually inserted, and both change in the same transaction.
pub fn join_community(
    pool: &DbPool,
    community_id: &str,
    session: &SessionContext,
) -> ApiResult<MembershipChange> {
    let user = session.require_user()?;
    validate_join_community_args(community_id)?;

    let mut conn = pool.get()?;
    let tx = conn.transaction().map_err(translate_db_error)?;

    // Fail fast so a join against a missing community is NotFound rather
    // than a dangling edge error.
    tx.query_row(
        "SELECT id FROM communities WHERE id = ?1",
        params![community_id],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(translate_db_error)?
    .ok_or(ApiError::NotFound("Community"))?;

    let now = Utc::now().to_rfc3339();
    let inserted = tx
        .execute(
            "INSERT OR IGNORE INTO community_members (community_id, user_id, joined_at)
             VALUES (?1, ?2, ?3)",
            params![community_id, user.id, now],
        )
        .map_err(translate_db_error)?;

    if inserted > 0 {
        tx.execute(
            "UPDATE communities SET members_count = members_count + 1, updated_at = ?2 WHERE id = ?1",
            params![community_id, now],
        )
        .map_err(translate_db_error)?;
    }

    let community = tx
        .query_row(
            &format!("SELECT {COMMUNITY_COLUMNS} FROM communities WHERE id = ?1"),
            params![community_id],
            community_from_row,
        )
        .map_err(translate_db_error)?;

    tx.commit().map_err(translate_db_error)?;
    Ok(MembershipChange {
        community,
        member: true,
    })
}

/// Mirror of join: leaving a community the caller is not a member of is a
/// no-op.
pub fn leave_community(
    pool: &DbPool,
    community_id: &str,
    session: &SessionContext,
) -> ApiResult<MembershipChange> {
    let user = session.require_user()?;
    validate_leave_community_args(community_id)?;

    let mut conn = pool.get()?;
    let tx = conn.transaction().map_err(translate_db_error)?;

    tx.query_row(
        "SELECT id FROM communities WHERE id = ?1",
        params![community_id],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(translate_db_error)?
    .ok_or(ApiError::NotFound("Community"))?;

    let removed = tx
        .execute(
            "DELETE FROM community_members WHERE community_id = ?1 AND user_id = ?2",
            params![community_id, user.id],
        )
        .map_err(translate_db_error)?;

    if removed > 0 {
        let now = Utc::now().to_rfc3339();
        tx.execute(
            "UPDATE communities SET members_count = members_count - 1, updated_at = ?2 WHERE id = ?1",
            params![community_id, now],
        )
        .map_err(translate_db_error)?;
    }

    let community = tx
        .query_row(
            &format!("SELECT {COMMUNITY_COLUMNS} FROM communities WHERE id = ?1"),
            params![community_id],
            community_from_row,
        )
        .map_err(translate_db_error)?;

    tx.commit().map_err(translate_db_error)?;
    Ok(MembershipChange {
        community,
        member: false,
    })
}
