use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use quorum_core::AppState;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::MaybeUser;

pub const LOGIN_PATH: &str = "/login";

/// `GET /polls/{id}/edit`: the poll as its owner sees it before editing.
///
/// Visitors without a session are sent to the login page. A poll that does
/// not exist and a poll owned by someone else both answer 404, so the page
/// never confirms that someone else's poll exists.
pub async fn edit_poll(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(poll_id): Path<String>,
) -> Result<Response, ApiError> {
    let Some(user) = user else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    let poll = quorum_core::polls::get_poll_for_edit(&state, &user, &poll_id).await?;
    Ok(Json(json!({ "error": null, "poll": poll })).into_response())
}
