pub mod community;
pub mod users;

pub const PAGINATION_LIMIT: i64 = 12;
