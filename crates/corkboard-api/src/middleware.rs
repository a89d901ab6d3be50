use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use corkboard_db::Database;
use corkboard_types::models::User;

use crate::auth::AppState;
use crate::credentials::{CredentialStore, to_user};
use crate::error::BoardError;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "board_session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
}

/// Signs and checks session tokens. A token is only ever issued after a
/// successful login, so a valid one proves that login happened.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            exp: (chrono::Utc::now() + self.ttl).timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// The user id in `token`, or `None` if it is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Option<i64> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .ok()
            .map(|data| data.claims.sub)
    }
}

/// Who is making the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn require_user(&self) -> Result<&User, BoardError> {
        self.user().ok_or(BoardError::Unauthorized)
    }
}

/// Turn the user id held by the session into an identity. A session pointing
/// at a user that no longer exists is an `IntegrityViolation`.
pub fn resolve_identity(db: &Database, user_id: Option<i64>) -> Result<Identity, BoardError> {
    let Some(user_id) = user_id else {
        return Ok(Identity::Anonymous);
    };

    CredentialStore::new(db)
        .find_by_id(user_id)?
        .map(|row| Identity::Authenticated(to_user(row)))
        .ok_or(BoardError::IntegrityViolation(user_id))
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Resolve the session cookie into an `Identity` request extension.
///
/// A stale session (valid token, deleted user) degrades to anonymous and the
/// cookie is cleared on the way out.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let user_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.verify(cookie.value()));

    let db = state.clone();
    let resolved = tokio::task::spawn_blocking(move || resolve_identity(&db.db, user_id)).await;

    let (identity, stale) = match resolved {
        Ok(Ok(identity)) => (identity, false),
        Ok(Err(BoardError::IntegrityViolation(id))) => {
            warn!("Session references missing user {}; treating as anonymous", id);
            (Identity::Anonymous, true)
        }
        Ok(Err(e)) => return e.into_response(),
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            return BoardError::Internal(e.to_string()).into_response();
        }
    };

    req.extensions_mut().insert(identity);
    let response = next.run(req).await;

    if stale && !sets_session_cookie(&response) {
        (jar.remove(clear_session_cookie()), response).into_response()
    } else {
        response
    }
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}
