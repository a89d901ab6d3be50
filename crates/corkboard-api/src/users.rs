use axum::{
    Extension, Json,
    extract::{Path, State},
};

use corkboard_types::api::ProfileView;

use crate::auth::{AppState, blocking};
use crate::board::Board;
use crate::error::BoardError;
use crate::middleware::Identity;

pub async fn user_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<i64>,
) -> Result<Json<ProfileView>, BoardError> {
    let context = state.page_context(&identity);
    let user = blocking(move || Board::new(&state.db).view_profile(user_id)).await?;
    Ok(Json(ProfileView { context, user }))
}
