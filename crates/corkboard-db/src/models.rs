/// Database row types — these map directly to SQLite rows.
/// Distinct from corkboard-types models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub content: String,
    pub writer_user_id: i64,
    /// `None` only if the writer row is gone, which foreign keys prevent.
    pub writer_username: Option<String>,
    pub created_at: String,
}
