use std::sync::Arc;

use chrono::Utc;
use quorum_db::DbError;
use quorum_models::poll::{Poll, PollResults};
use quorum_models::user::CurrentUser;
use quorum_models::vote::Vote;

use crate::error::PollError;
use crate::events::Invalidation;
use crate::validation::{validate_option_index, validate_poll_id, validate_poll_input};
use crate::AppState;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Create a poll owned by `user`.
pub async fn create_poll(
    state: &AppState,
    user: Option<&CurrentUser>,
    question: &str,
    options: &[String],
) -> Result<Poll, PollError> {
    let input = validate_poll_input(question, options)?;
    let user = user.ok_or(PollError::Unauthenticated(
        "You must be logged in to create a poll.",
    ))?;

    let row = quorum_db::polls::create_poll(
        &state.db,
        &new_id(),
        &user.id,
        &input.question,
        &input.options,
        Utc::now(),
    )
    .await?;

    tracing::info!(poll_id = %row.id, user_id = %user.id, "poll created");
    state.invalidate(Invalidation::poll_listing(&user.id)).await;
    Ok(row.into())
}

/// The caller's polls, newest first.
pub async fn get_user_polls(
    state: &AppState,
    user: Option<&CurrentUser>,
) -> Result<Arc<Vec<Poll>>, PollError> {
    let user = user.ok_or(PollError::Unauthenticated("Not authenticated"))?;

    if let Some(cached) = state.listing_cache.get(&user.id).await {
        return Ok(cached);
    }

    let epoch = state.listing_cache.epoch();
    let rows = quorum_db::polls::list_user_polls(&state.db, &user.id).await?;
    let polls: Arc<Vec<Poll>> = Arc::new(rows.into_iter().map(Poll::from).collect());
    if !state
        .listing_cache
        .store(&user.id, epoch, Arc::clone(&polls))
        .await
    {
        tracing::debug!(user_id = %user.id, "listing changed while loading, not cached");
    }
    Ok(polls)
}

/// Any poll is readable by anyone who knows its id.
pub async fn get_poll_by_id(state: &AppState, poll_id: &str) -> Result<Poll, PollError> {
    let row = quorum_db::polls::get_poll(&state.db, poll_id)
        .await?
        .ok_or(PollError::NotFound)?;
    Ok(row.into())
}

/// Load a poll for its owner to edit. Missing polls and polls owned by
/// someone else are indistinguishable.
pub async fn get_poll_for_edit(
    state: &AppState,
    user: &CurrentUser,
    poll_id: &str,
) -> Result<Poll, PollError> {
    let poll = get_poll_by_id(state, poll_id).await?;
    if poll.user_id != user.id {
        return Err(PollError::NotFound);
    }
    Ok(poll)
}

/// Record a vote for option `option_index` (zero-based).
///
/// Authenticated callers get one vote per poll; anonymous callers are not
/// limited.
pub async fn submit_vote(
    state: &AppState,
    user: Option<&CurrentUser>,
    poll_id: &str,
    option_index: i64,
) -> Result<Vote, PollError> {
    validate_poll_id(poll_id)?;
    let index = validate_option_index(option_index)?;

    let options = quorum_db::polls::get_poll_options(&state.db, poll_id)
        .await?
        .ok_or(PollError::NotFound)?;
    if index >= options.len() {
        return Err(PollError::InvalidOption);
    }

    let voter = user.map(|u| u.id.as_str());
    if let Some(user_id) = voter {
        let existing = quorum_db::votes::get_user_vote(&state.db, poll_id, user_id).await?;
        if existing.is_some() {
            return Err(PollError::AlreadyVoted);
        }
    }

    // The unique index on (poll_id, user_id) catches votes that race past
    // the check above.
    let row = quorum_db::votes::create_vote(&state.db, &new_id(), poll_id, voter, option_index)
        .await
        .map_err(|e| match e {
            DbError::Conflict(_) => PollError::AlreadyVoted,
            other => PollError::from(other),
        })?;

    tracing::debug!(poll_id, option_index, anonymous = voter.is_none(), "vote recorded");
    state.invalidate(Invalidation::poll_results(poll_id)).await;
    Ok(row.into())
}

pub async fn get_poll_results(state: &AppState, poll_id: &str) -> Result<PollResults, PollError> {
    let options = quorum_db::polls::get_poll_options(&state.db, poll_id)
        .await?
        .ok_or(PollError::NotFound)?;

    let mut counts = vec![0_i64; options.len()];
    for (index, count) in quorum_db::votes::count_votes_by_option(&state.db, poll_id).await? {
        if let Some(slot) = usize::try_from(index).ok().and_then(|i| counts.get_mut(i)) {
            *slot = count;
        }
    }

    Ok(PollResults {
        poll_id: poll_id.to_string(),
        total_votes: counts.iter().sum(),
        counts,
    })
}

pub async fn delete_poll(
    state: &AppState,
    user: Option<&CurrentUser>,
    poll_id: &str,
) -> Result<(), PollError> {
    let user = user.ok_or(PollError::Unauthenticated(
        "You must be logged in to delete a poll.",
    ))?;

    let owner = quorum_db::polls::get_poll_owner(&state.db, poll_id)
        .await?
        .ok_or(PollError::NotFound)?;
    if owner != user.id {
        return Err(PollError::Forbidden("You can only delete your own polls."));
    }

    // Filtered by owner again in case ownership changed since the read.
    if !quorum_db::polls::delete_poll(&state.db, poll_id, &user.id).await? {
        return Err(PollError::NotFound);
    }

    tracing::info!(poll_id, user_id = %user.id, "poll deleted");
    state.invalidate(Invalidation::poll_listing(&user.id)).await;
    Ok(())
}

/// Replace a poll's question and options. Same validation as create.
pub async fn update_poll(
    state: &AppState,
    user: Option<&CurrentUser>,
    poll_id: &str,
    question: &str,
    options: &[String],
) -> Result<Poll, PollError> {
    let input = validate_poll_input(question, options)?;
    let user = user.ok_or(PollError::Unauthenticated(
        "You must be logged in to update a poll.",
    ))?;

    let updated = quorum_db::polls::update_poll(
        &state.db,
        poll_id,
        &user.id,
        &input.question,
        &input.options,
        Utc::now(),
    )
    .await?;

    if !updated {
        return match quorum_db::polls::get_poll_owner(&state.db, poll_id).await? {
            Some(_) => Err(PollError::Forbidden("You can only update your own polls.")),
            None => Err(PollError::NotFound),
        };
    }

    tracing::info!(poll_id, user_id = %user.id, "poll updated");
    state.invalidate(Invalidation::poll_listing(&user.id)).await;
    get_poll_by_id(state, poll_id).await
}
