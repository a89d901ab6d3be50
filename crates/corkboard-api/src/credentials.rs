use corkboard_db::Database;
use corkboard_db::models::UserRow;
use corkboard_types::models::User;

use crate::board::parse_timestamp;
use crate::error::BoardError;
use crate::password;

/// Users and their salted password hashes. Plaintext passwords go in, only
/// hashes are stored.
pub struct CredentialStore<'a> {
    db: &'a Database,
}

impl<'a> CredentialStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create_user(&self, username: &str, raw_password: &str) -> Result<i64, BoardError> {
        let password_hash = password::hash_password(raw_password)?;
        Ok(self.db.create_user(username, &password_hash)?)
    }

    /// Exact, case-sensitive match.
    pub fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, BoardError> {
        Ok(self.db.get_user_by_username(username)?)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<UserRow>, BoardError> {
        Ok(self.db.get_user_by_id(id)?)
    }

    pub fn verify_password(&self, user: &UserRow, raw_password: &str) -> Result<bool, BoardError> {
        Ok(password::verify_password(raw_password, &user.password)?)
    }
}

/// Strip the hash off a stored row.
pub fn to_user(row: UserRow) -> User {
    User {
        created_at: parse_timestamp(&row.created_at, "user", row.id),
        id: row.id,
        username: row.username,
    }
}
