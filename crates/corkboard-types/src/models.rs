use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered board member. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A posted message with its writer resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub writer_id: i64,
    pub writer_username: String,
    pub created_at: DateTime<Utc>,
}
