use axum::{
    Extension, Form, Json,
    extract::{Path, State, rejection::FormRejection},
    response::Redirect,
};

use corkboard_types::api::{FeedView, FormView, PageView, PostMessageForm};

use crate::auth::{AppState, blocking};
use crate::board::{Board, PAGE_SIZE};
use crate::error::BoardError;
use crate::middleware::Identity;

/// Site root: the first page of the feed, the viewer and the countdown.
pub async fn index(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<FeedView>, BoardError> {
    let context = state.page_context(&identity);
    let messages = blocking(move || Board::new(&state.db).list_feed()).await?;

    Ok(Json(FeedView { context, messages }))
}

pub async fn new_comment_form(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<FormView> {
    Json(FormView::new("/new_comment", &["content"]).with_context(state.page_context(&identity)))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    form: Result<Form<PostMessageForm>, FormRejection>,
) -> Result<Redirect, BoardError> {
    // Anonymous writers get 401 before the body is even looked at
    identity.require_user()?;
    let Form(form) = form.map_err(|e| BoardError::InvalidInput(e.body_text()))?;

    blocking(move || Board::new(&state.db).post_message(&identity, &form.content)).await?;
    Ok(Redirect::to("/"))
}

pub async fn comments_page(
    State(state): State<AppState>,
    Path(page): Path<u32>,
) -> Result<Json<PageView>, BoardError> {
    let messages = blocking(move || Board::new(&state.db).list_page(page)).await?;

    Ok(Json(PageView {
        page,
        page_size: PAGE_SIZE,
        messages,
    }))
}
