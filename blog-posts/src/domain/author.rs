use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: i64,
    pub display_name: String,
    pub avatar: Option<String>,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Author {
    pub fn new(display_name: String, email: String, is_admin: bool) -> Self {
        Self {
            id: 0,
            display_name,
            avatar: None,
            email,
            is_admin,
            created_at: Utc::now(),
        }
    }
}
