pub mod auth;
pub mod board;
pub mod countdown;
pub mod credentials;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod password;
pub mod router;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::BoardError;
