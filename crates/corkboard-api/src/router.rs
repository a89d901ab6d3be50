use axum::{
    Router, middleware,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::messages;
use crate::middleware::resolve_session;
use crate::users;

/// Every route sits behind the session gate, so handlers can always extract
/// an `Identity`.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/", get(messages::index))
        .route("/users/{user_id}", get(users::user_profile))
        .route("/logout", get(auth::logout))
        .route(
            "/new_comment",
            get(messages::new_comment_form).post(messages::post_comment),
        )
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/comments/{page}", get(messages::comments_page))
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
