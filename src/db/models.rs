use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub prefixed_name: String,
    pub password_hash: String,
    pub profile_pic: Option<String>,
    pub karma: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub name: String,
    pub prefixed_name: String,
    pub description: String,
    pub icon: Option<String>,
    pub admin_id: String,
    pub members_count: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}
