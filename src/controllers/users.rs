use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::auth::token::{self, Claims};
use crate::auth::SessionContext;
use crate::db::models::{Community, User};
use crate::error::{translate_db_error, ApiError, ApiResult};
use crate::state::DbPool;
use crate::validations::users::{
    validate_get_user_details_args, validate_login_user_details, validate_register_user_details,
    validate_update_user_args,
};

/// Matches the cost the passwords in production were hashed with.
const BCRYPT_COST: u32 = 10;

/// Verified against when the username does not exist, so both login failure
/// paths do comparable work and report the same message.
const DUMMY_HASH: &str = "$2b$10$7EqJtq98hPqEX7fNZaFWoOCKaWLB7KHWC5c0z6p1gJXl0u0GiLtLO";

const USER_COLUMNS: &str =
    "id, username, prefixed_name, password_hash, profile_pic, karma, created_at, updated_at";
const COMMUNITY_COLUMNS: &str =
    "id, name, prefixed_name, description, icon, admin_id, members_count, created_at, updated_at";

pub struct UserWithToken {
    pub user: User,
    pub token: String,
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

fn issue_token(user: &User, secret: &str) -> ApiResult<String> {
    let claims = Claims {
        id: user.id.clone(),
        username: user.username.clone(),
    };
    token::sign(&claims, secret).map_err(|err| {
        tracing::error!("Failed to sign token: {}", err);
        ApiError::Unknown
    })
}

/// Case-insensitive substring search over usernames. Unbounded result set.
pub fn list_users(pool: &DbPool, search: Option<&str>) -> ApiResult<Vec<User>> {
    let conn = pool.get()?;
    let search = search.unwrap_or("");

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE lower(username) LIKE '%' || lower(?1) || '%'"
        ))
        .map_err(translate_db_error)?;

    let users = stmt
        .query_map(params![search], user_from_row)
        .map_err(translate_db_error)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(users)
}

pub fn register_user(
    pool: &DbPool,
    username: &str,
    password: &str,
    secret: &str,
) -> ApiResult<UserWithToken> {
    validate_register_user_details(username, password)?;

    let password_hash = bcrypt::hash(password, BCRYPT_COST).map_err(|err| {
        tracing::error!("Failed to hash password: {}", err);
        ApiError::Unknown
    })?;

    let conn = pool.get()?;
    let id = uuid::Uuid::now_v7().to_string();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO users (id, username, prefixed_name, password_hash, karma, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![id, username, format!("u/{}", username), password_hash, now],
    )
    .map_err(translate_db_error)?;

    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .map_err(translate_db_error)?;

    let token = issue_token(&user, secret)?;
    Ok(UserWithToken { user, token })
}

/// A missing user and a wrong password fail identically, so the response
/// never reveals which one it was.
pub fn login_user(
    pool: &DbPool,
    username: &str,
    password: &str,
    secret: &str,
) -> ApiResult<UserWithToken> {
    validate_login_user_details(username, password)?;

    let conn = pool.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(translate_db_error)?;

    let password_correct = match &user {
        Some(user) => bcrypt::verify(password, &user.password_hash).unwrap_or(false),
        None => {
            let _ = bcrypt::verify(password, DUMMY_HASH);
            false
        }
    };

    let Some(user) = user.filter(|_| password_correct) else {
        return Err(ApiError::input("Invalid username or password"));
    };

    let token = issue_token(&user, secret)?;
    Ok(UserWithToken { user, token })
}

/// Updates only the profile picture reference of the current user.
pub fn update_logged_in_user(
    pool: &DbPool,
    profile_pic: &str,
    session: &SessionContext,
) -> ApiResult<User> {
    let current = session.require_user()?;
    validate_update_user_args(profile_pic)?;

    let conn = pool.get()?;
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE users SET profile_pic = ?1, updated_at = ?2 WHERE id = ?3",
        params![profile_pic, now, current.id],
    )
    .map_err(translate_db_error)?;

    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![current.id],
        user_from_row,
    )
    .map_err(translate_db_error)
}

/// The communities the current user has joined, most recent first.
pub fn user_subscriptions(pool: &DbPool, session: &SessionContext) -> ApiResult<Vec<Community>> {
    let current = session.require_user()?;

    let conn = pool.get()?;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities c
             JOIN community_members m ON m.community_id = c.id
             WHERE m.user_id = ?1
             ORDER BY m.joined_at DESC"
        ))
        .map_err(translate_db_error)?;

    let communities = stmt
        .query_map(params![current.id], community_from_row)
        .map_err(translate_db_error)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(communities)
}

pub fn user_details(pool: &DbPool, username: &str) -> ApiResult<User> {
    validate_get_user_details_args(username)?;

    let conn = pool.get()?;
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
        params![username],
        user_from_row,
    )
    .optional()
    .map_err(translate_db_error)?
    .ok_or(ApiError::NotFound("User"))
}
