use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use quorum_models::vote::Vote;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoteRow {
    pub id: String,
    pub poll_id: String,
    pub user_id: Option<String>,
    pub option_index: i64,
    pub created_at: DateTime<Utc>,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Vote {
            id: row.id,
            poll_id: row.poll_id,
            user_id: row.user_id,
            option_index: row.option_index,
            created_at: row.created_at,
        }
    }
}

/// Inserts a vote. A second vote by the same user on the same poll fails
/// with [`DbError::Conflict`]; anonymous votes (`user_id = None`) never do.
pub async fn create_vote(
    pool: &DbPool,
    id: &str,
    poll_id: &str,
    user_id: Option<&str>,
    option_index: i64,
) -> Result<VoteRow, DbError> {
    let row = sqlx::query_as::<_, VoteRow>(
        "INSERT INTO votes (id, poll_id, user_id, option_index, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id, poll_id, user_id, option_index, created_at",
    )
    .bind(id)
    .bind(poll_id)
    .bind(user_id)
    .bind(option_index)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(DbError::from_write)?;
    Ok(row)
}

pub async fn get_user_vote(
    pool: &DbPool,
    poll_id: &str,
    user_id: &str,
) -> Result<Option<VoteRow>, DbError> {
    let row = sqlx::query_as::<_, VoteRow>(
        "SELECT id, poll_id, user_id, option_index, created_at
         FROM votes WHERE poll_id = ?1 AND user_id = ?2",
    )
    .bind(poll_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// `(option_index, vote_count)` pairs for every option that has votes.
pub async fn count_votes_by_option(pool: &DbPool, poll_id: &str) -> Result<Vec<(i64, i64)>, DbError> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT option_index, COUNT(*)
         FROM votes
         WHERE poll_id = ?1
         GROUP BY option_index
         ORDER BY option_index",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
