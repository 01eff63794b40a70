use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Form;
use quorum_core::error::PollError;
use quorum_core::validation::{option_index_from_json, validate_poll_id};
use quorum_core::AppState;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::MaybeUser;

#[derive(Debug, Default, Deserialize)]
pub struct PollBody {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Poll question and options, from either a URL-encoded form (one
/// `options` field per option) or a JSON body.
pub struct PollForm(pub PollBody);

impl<S: Send + Sync> FromRequest<S> for PollForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let body = if is_json {
            Json::<PollBody>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?
                .0
        } else {
            Form::<PollBody>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?
                .0
        };
        Ok(PollForm(body))
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub option_index: Value,
}

/// `POST /polls`
pub async fn create_poll(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    PollForm(body): PollForm,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let poll =
        quorum_core::polls::create_poll(&state, user.as_ref(), &body.question, &body.options)
            .await?;
    Ok((StatusCode::CREATED, Json(json!({ "error": null, "poll": poll }))))
}

/// `GET /polls`: the caller's own polls. Anonymous callers get an empty
/// list alongside the error rather than a bare failure.
pub async fn list_polls(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Response {
    match quorum_core::polls::get_user_polls(&state, user.as_ref()).await {
        Ok(polls) => Json(json!({ "error": null, "polls": polls.as_ref() })).into_response(),
        Err(e @ PollError::Unauthenticated(_)) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": "UNAUTHORIZED", "error": e.to_string(), "polls": [] })),
        )
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// `GET /polls/{id}`
pub async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let poll = quorum_core::polls::get_poll_by_id(&state, &poll_id).await?;
    Ok(Json(json!({ "error": null, "poll": poll })))
}

/// `POST /polls/{id}` and `PUT /polls/{id}`
pub async fn update_poll(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(poll_id): Path<String>,
    PollForm(body): PollForm,
) -> Result<Json<Value>, ApiError> {
    let poll = quorum_core::polls::update_poll(
        &state,
        user.as_ref(),
        &poll_id,
        &body.question,
        &body.options,
    )
    .await?;
    Ok(Json(json!({ "error": null, "poll": poll })))
}

/// `DELETE /polls/{id}`
pub async fn delete_poll(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(poll_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    quorum_core::polls::delete_poll(&state, user.as_ref(), &poll_id).await?;
    Ok(Json(json!({ "error": null })))
}

/// `POST /polls/{id}/vote`
pub async fn submit_vote(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(poll_id): Path<String>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_poll_id(&poll_id).map_err(PollError::from)?;
    let option_index = option_index_from_json(&body.option_index).map_err(PollError::from)?;
    let vote =
        quorum_core::polls::submit_vote(&state, user.as_ref(), &poll_id, option_index).await?;
    Ok((StatusCode::CREATED, Json(json!({ "error": null, "vote": vote }))))
}

/// `GET /polls/{id}/results`
pub async fn poll_results(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let results = quorum_core::polls::get_poll_results(&state, &poll_id).await?;
    Ok(Json(json!({ "error": null, "results": results })))
}
