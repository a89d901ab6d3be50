use std::sync::Arc;

use axum::{
    Extension, Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use corkboard_db::Database;
use corkboard_types::api::{FormView, LoginForm, PageContext, SignupForm, UserView};

use crate::board::{Board, LOGIN_ERROR};
use crate::countdown::Countdown;
use crate::error::BoardError;
use crate::middleware::{Identity, SessionKeys, clear_session_cookie, session_cookie};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionKeys,
    pub countdown: Option<Countdown>,
}

impl AppStateInner {
    /// The viewer and countdown every page carries.
    pub fn page_context(&self, identity: &Identity) -> PageContext {
        PageContext {
            viewer: identity.user().cloned().map(UserView::from),
            countdown: self.countdown.map(|c| c.remaining(chrono::Utc::now())),
        }
    }
}

/// Run store or hashing work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, BoardError>
where
    F: FnOnce() -> Result<T, BoardError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        BoardError::Internal(e.to_string())
    })?
}

fn signup_view() -> FormView {
    FormView::new("/signup", &["username", "password"])
}

fn login_view() -> FormView {
    FormView::new("/login", &["username", "password"])
}

pub async fn signup_form(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<FormView> {
    Json(signup_view().with_context(state.page_context(&identity)))
}

/// Create the account and send the user home. They still have to log in.
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Redirect, BoardError> {
    blocking(move || Board::new(&state.db).signup(&form.username, &form.password)).await?;
    Ok(Redirect::to("/"))
}

pub async fn login_form(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<FormView> {
    Json(login_view().with_context(state.page_context(&identity)))
}

/// On success set the session cookie and go home; on failure show the form
/// again with the same message regardless of what was wrong.
pub async fn login(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, BoardError> {
    let db = state.clone();
    let result =
        blocking(move || Board::new(&db.db).login(&form.username, &form.password)).await;

    let user = match result {
        Ok(user) => user,
        Err(BoardError::InvalidCredentials) => {
            let view = login_view()
                .with_context(state.page_context(&identity))
                .with_error(LOGIN_ERROR);
            return Ok(Json(view).into_response());
        }
        Err(e) => return Err(e),
    };

    let token = state
        .sessions
        .issue(user.id)
        .map_err(|e| BoardError::Internal(e.to_string()))?;

    Ok((jar.add(session_cookie(token)), Redirect::to("/")).into_response())
}

pub async fn logout(
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Some(user) = identity.user() {
        info!("User {} logged out", user.id);
    }
    (jar.remove(clear_session_cookie()), Redirect::to("/"))
}
