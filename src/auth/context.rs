use rusqlite::params;

use crate::auth::token;
use crate::error::ApiError;
use crate::state::DbPool;

/// Represents the currently authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

/// Per-request identity resolved from the Authorization header. Anonymous when
/// the header is absent, malformed, carries a bad signature, or references a
/// user that no longer exists — an invalid token is never a request failure.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub current_user: Option<CurrentUser>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Gate for operations that require identity.
    pub fn require_user(&self) -> Result<&CurrentUser, ApiError> {
        self.current_user.as_ref().ok_or(ApiError::Authentication)
    }
}

/// Build the session context for one request. Performs at most one user
/// lookup, and only when a bearer token is present.
pub fn build(pool: &DbPool, authorization: Option<&str>, secret: &str) -> SessionContext {
    let Some(header) = authorization else {
        return SessionContext::anonymous();
    };

    let Some(prefix) = header.get(..7) else {
        return SessionContext::anonymous();
    };
    if !prefix.eq_ignore_ascii_case("bearer ") {
        return SessionContext::anonymous();
    }

    let claims = match token::verify(&header[7..], secret) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!("Token verification failed: {}", err);
            return SessionContext::anonymous();
        }
    };

    let conn = match pool.get() {
        Ok(conn) => conn,
        Err(err) => {
            tracing::warn!("Pool error while resolving current user: {}", err);
            return SessionContext::anonymous();
        }
    };

    let user = conn
        .query_row(
            "SELECT id, username FROM users WHERE id = ?1",
            params![claims.id],
            |row| {
                Ok(CurrentUser {
                    id: row.get(0)?,
                    username: row.get(1)?,
                })
            },
        )
        .ok();

    SessionContext { current_user: user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::Claims;
    use crate::db;
    use r2d2_sqlite::SqliteConnectionManager;

    const SECRET: &str = "test-secret";

    fn test_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
        db::run_migrations(&pool).unwrap();
        pool
    }

    fn seed_user(pool: &DbPool, id: &str, username: &str) {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, username, prefixed_name, password_hash) VALUES (?1, ?2, ?3, 'hash')",
            params![id, username, format!("u/{}", username)],
        )
        .unwrap();
    }

    #[test]
    fn missing_header_is_anonymous() {
        let pool = test_pool();
        let ctx = build(&pool, None, SECRET);
        assert!(ctx.current_user.is_none());
    }

    #[test]
    fn non_bearer_header_is_anonymous() {
        let pool = test_pool();
        let ctx = build(&pool, Some("Basic dXNlcjpwYXNz"), SECRET);
        assert!(ctx.current_user.is_none());
    }

    #[test]
    fn bad_signature_is_anonymous_not_an_error() {
        let pool = test_pool();
        seed_user(&pool, "u1", "alice");
        let token = token::sign(
            &Claims {
                id: "u1".to_string(),
                username: "alice".to_string(),
            },
            "wrong-secret",
        )
        .unwrap();
        let ctx = build(&pool, Some(&format!("Bearer {}", token)), SECRET);
        assert!(ctx.current_user.is_none());
    }

    #[test]
    fn token_for_deleted_user_is_anonymous() {
        let pool = test_pool();
        let token = token::sign(
            &Claims {
                id: "ghost".to_string(),
                username: "ghost".to_string(),
            },
            SECRET,
        )
        .unwrap();
        let ctx = build(&pool, Some(&format!("Bearer {}", token)), SECRET);
        assert!(ctx.current_user.is_none());
    }

    #[test]
    fn valid_token_resolves_current_user() {
        let pool = test_pool();
        seed_user(&pool, "u1", "alice");
        let token = token::sign(
            &Claims {
                id: "u1".to_string(),
                username: "alice".to_string(),
            },
            SECRET,
        )
        .unwrap();
        let ctx = build(&pool, Some(&format!("bearer {}", token)), SECRET);
        let user = ctx.current_user.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn require_user_fails_for_anonymous() {
        let ctx = SessionContext::anonymous();
        assert_eq!(ctx.require_user().unwrap_err(), ApiError::Authentication);
    }
}
