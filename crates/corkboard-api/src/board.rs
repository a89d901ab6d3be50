use tracing::{error, info, warn};

use corkboard_db::Database;
use corkboard_db::models::MessageRow;
use corkboard_types::api::{MessageView, UserView};
use corkboard_types::models::{Message, User};

use crate::credentials::{CredentialStore, to_user};
use crate::error::BoardError;
use crate::middleware::Identity;
use crate::password::verify_dummy;

/// Messages on the site root.
pub const FEED_SIZE: u32 = 10;

/// Messages per `/comments/{page}` page.
pub const PAGE_SIZE: u32 = 5;

/// Matches the `users.username` column width.
pub const MAX_USERNAME_LENGTH: usize = 80;

/// Shown for every failed login, whichever half of the credentials was wrong.
pub const LOGIN_ERROR: &str = "Invalid username or password.";

/// Board operations over the stores. Handlers call these from blocking tasks;
/// nothing here knows about HTTP.
pub struct Board<'a> {
    db: &'a Database,
}

impl<'a> Board<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn credentials(&self) -> CredentialStore<'a> {
        CredentialStore::new(self.db)
    }

    /// Register a user. Does not log them in.
    pub fn signup(&self, username: &str, password: &str) -> Result<i64, BoardError> {
        if username.is_empty() {
            return Err(BoardError::InvalidInput("username must not be empty".into()));
        }
        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(BoardError::InvalidInput(format!(
                "username must be at most {MAX_USERNAME_LENGTH} characters"
            )));
        }
        if password.is_empty() {
            return Err(BoardError::InvalidInput("password must not be empty".into()));
        }

        let user_id = self.credentials().create_user(username, password)?;
        info!("User {} signed up as '{}'", user_id, username);
        Ok(user_id)
    }

    /// Check credentials. Unknown usernames and wrong passwords fail the same way.
    pub fn login(&self, username: &str, password: &str) -> Result<User, BoardError> {
        let credentials = self.credentials();
        let Some(row) = credentials.find_by_username(username)? else {
            // Same Argon2 cost as a wrong password
            verify_dummy(password);
            warn!("Login failed: unknown username '{}'", username);
            return Err(BoardError::InvalidCredentials);
        };

        if !credentials.verify_password(&row, password)? {
            warn!("Login failed: wrong password for user {}", row.id);
            return Err(BoardError::InvalidCredentials);
        }

        info!("User {} logged in", row.id);
        Ok(to_user(row))
    }

    pub fn post_message(&self, identity: &Identity, content: &str) -> Result<i64, BoardError> {
        let user = identity.require_user()?;
        let message_id = self.db.create_message(user.id, content)?;
        info!("User {} posted message {}", user.id, message_id);
        Ok(message_id)
    }

    pub fn view_profile(&self, user_id: i64) -> Result<UserView, BoardError> {
        self.credentials()
            .find_by_id(user_id)?
            .map(|row| to_user(row).into())
            .ok_or(BoardError::NotFound)
    }

    /// The first `FEED_SIZE` messages, oldest first.
    pub fn list_feed(&self) -> Result<Vec<MessageView>, BoardError> {
        self.db
            .list_recent(FEED_SIZE)?
            .into_iter()
            .map(to_message_view)
            .collect()
    }

    /// Page `page_number` (1-indexed) of `PAGE_SIZE` messages; empty past the end.
    pub fn list_page(&self, page_number: u32) -> Result<Vec<MessageView>, BoardError> {
        self.db
            .list_page(page_number, PAGE_SIZE)?
            .into_iter()
            .map(to_message_view)
            .collect()
    }
}

fn to_message_view(row: MessageRow) -> Result<MessageView, BoardError> {
    let Some(writer_username) = row.writer_username else {
        error!(
            "Message {} references missing user {}",
            row.id, row.writer_user_id
        );
        return Err(BoardError::IntegrityViolation(row.writer_user_id));
    };

    Ok(Message {
        created_at: parse_timestamp(&row.created_at, "message", row.id),
        id: row.id,
        content: row.content,
        writer_id: row.writer_user_id,
        writer_username,
    }
    .into())
}

/// Parse a timestamp column. SQLite stores `datetime('now')` as
/// "YYYY-MM-DD HH:MM:SS" without a timezone; that is read as UTC.
pub(crate) fn parse_timestamp(raw: &str, kind: &str, id: i64) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} {}: {}", raw, kind, id, e);
            chrono::DateTime::default()
        })
}
