use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Message, User};

// -- Forms --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMessageForm {
    pub content: String,
}

/// Shown on every page next to its own content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContext {
    pub viewer: Option<UserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<CountdownView>,
}

/// Describes a form the client should render. `error` is set when a
/// submission was rejected and the form is shown again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormView {
    #[serde(flatten)]
    pub context: PageContext,
    pub action: String,
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormView {
    pub fn new(action: &str, fields: &[&str]) -> Self {
        Self {
            context: PageContext::default(),
            action: action.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            error: None,
        }
    }

    pub fn with_context(mut self, context: PageContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

// -- Users --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub context: PageContext,
    #[serde(flatten)]
    pub user: UserView,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

// -- Messages --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: i64,
    pub content: String,
    pub writer_id: i64,
    pub writer_username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            content: message.content,
            writer_id: message.writer_id,
            writer_username: message.writer_username,
            created_at: message.created_at,
        }
    }
}

/// Time left until the configured countdown date. Both fields go negative
/// once the date has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownView {
    pub target: NaiveDate,
    pub days: i64,
    pub seconds: i64,
}

/// The site root: the first page of messages plus whoever is looking at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedView {
    #[serde(flatten)]
    pub context: PageContext,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub page: u32,
    pub page_size: u32,
    pub messages: Vec<MessageView>,
}
