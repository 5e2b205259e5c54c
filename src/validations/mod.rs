pub mod community;
pub mod users;
