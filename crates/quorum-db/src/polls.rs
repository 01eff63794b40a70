use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use quorum_models::poll::Poll;
use sqlx::types::Json;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollRow {
    pub id: String,
    pub user_id: String,
    pub question: String,
    pub options: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PollRow> for Poll {
    fn from(row: PollRow) -> Self {
        Poll {
            id: row.id,
            user_id: row.user_id,
            question: row.question,
            options: row.options.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub async fn create_poll(
    pool: &DbPool,
    id: &str,
    user_id: &str,
    question: &str,
    options: &[String],
    created_at: DateTime<Utc>,
) -> Result<PollRow, DbError> {
    let row = sqlx::query_as::<_, PollRow>(
        "INSERT INTO polls (id, user_id, question, options, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id, user_id, question, options, created_at, updated_at",
    )
    .bind(id)
    .bind(user_id)
    .bind(question)
    .bind(Json(options))
    .bind(created_at)
    .fetch_one(pool)
    .await
    .map_err(DbError::from_write)?;
    Ok(row)
}

pub async fn get_poll(pool: &DbPool, id: &str) -> Result<Option<PollRow>, DbError> {
    let row = sqlx::query_as::<_, PollRow>(
        "SELECT id, user_id, question, options, created_at, updated_at
         FROM polls WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_poll_owner(pool: &DbPool, id: &str) -> Result<Option<String>, DbError> {
    let owner = sqlx::query_scalar::<_, String>("SELECT user_id FROM polls WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(owner)
}

pub async fn get_poll_options(pool: &DbPool, id: &str) -> Result<Option<Vec<String>>, DbError> {
    let options = sqlx::query_scalar::<_, Json<Vec<String>>>("SELECT options FROM polls WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(options.map(|json| json.0))
}

/// Polls owned by `user_id`, newest first. Rows created within the same
/// timestamp fall back to insertion order.
pub async fn list_user_polls(pool: &DbPool, user_id: &str) -> Result<Vec<PollRow>, DbError> {
    let rows = sqlx::query_as::<_, PollRow>(
        "SELECT id, user_id, question, options, created_at, updated_at
         FROM polls
         WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns `false` when no poll with that id belongs to `user_id`.
pub async fn update_poll(
    pool: &DbPool,
    id: &str,
    user_id: &str,
    question: &str,
    options: &[String],
    now: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE polls
         SET question = ?3, options = ?4, updated_at = ?5
         WHERE id = ?1 AND user_id = ?2",
    )
    .bind(id)
    .bind(user_id)
    .bind(question)
    .bind(Json(options))
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns `false` when no poll with that id belongs to `user_id`.
pub async fn delete_poll(pool: &DbPool, id: &str, user_id: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM polls WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pool;

    fn options(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_and_get_poll() {
        let pool = test_pool().await;
        let created = create_poll(&pool, "p1", "alice", "Best color?", &options(&["Red", "Blue"]), Utc::now())
            .await
            .unwrap();
        assert_eq!(created.user_id, "alice");
        assert_eq!(created.options.0, options(&["Red", "Blue"]));
        assert!(created.updated_at.is_none());

        let fetched = get_poll(&pool, "p1").await.unwrap().unwrap();
        assert_eq!(fetched.question, "Best color?");
        assert_eq!(fetched.options.0.len(), 2);
    }

    #[tokio::test]
    async fn test_get_poll_not_found() {
        let pool = test_pool().await;
        assert!(get_poll(&pool, "missing").await.unwrap().is_none());
        assert!(get_poll_owner(&pool, "missing").await.unwrap().is_none());
        assert!(get_poll_options(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_a_conflict() {
        let pool = test_pool().await;
        create_poll(&pool, "p1", "alice", "Q", &options(&["a", "b"]), Utc::now())
            .await
            .unwrap();
        let err = create_poll(&pool, "p1", "bob", "Q", &options(&["a", "b"]), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_user_polls_newest_first() {
        let pool = test_pool().await;
        let earlier = Utc::now() - chrono::Duration::minutes(5);
        create_poll(&pool, "old", "alice", "Old?", &options(&["a", "b"]), earlier)
            .await
            .unwrap();
        create_poll(&pool, "new", "alice", "New?", &options(&["a", "b"]), Utc::now())
            .await
            .unwrap();
        create_poll(&pool, "other", "bob", "Bob's?", &options(&["a", "b"]), Utc::now())
            .await
            .unwrap();

        let polls = list_user_polls(&pool, "alice").await.unwrap();
        let ids: Vec<&str> = polls.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_update_poll_filters_by_owner() {
        let pool = test_pool().await;
        create_poll(&pool, "p1", "alice", "Q", &options(&["a", "b"]), Utc::now())
            .await
            .unwrap();

        let by_other = update_poll(&pool, "p1", "bob", "Hijacked", &options(&["x", "y"]), Utc::now())
            .await
            .unwrap();
        assert!(!by_other);
        assert_eq!(get_poll(&pool, "p1").await.unwrap().unwrap().question, "Q");

        let by_owner = update_poll(&pool, "p1", "alice", "Q2", &options(&["c", "d", "e"]), Utc::now())
            .await
            .unwrap();
        assert!(by_owner);
        let row = get_poll(&pool, "p1").await.unwrap().unwrap();
        assert_eq!(row.question, "Q2");
        assert_eq!(row.options.0, options(&["c", "d", "e"]));
        assert!(row.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_poll_filters_by_owner() {
        let pool = test_pool().await;
        create_poll(&pool, "p1", "alice", "Q", &options(&["a", "b"]), Utc::now())
            .await
            .unwrap();

        assert!(!delete_poll(&pool, "p1", "bob").await.unwrap());
        assert!(get_poll(&pool, "p1").await.unwrap().is_some());

        assert!(delete_poll(&pool, "p1", "alice").await.unwrap());
        assert!(get_poll(&pool, "p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_row_converts_into_model() {
        let pool = test_pool().await;
        let row = create_poll(&pool, "p1", "alice", "Q", &options(&["a", "b"]), Utc::now())
            .await
            .unwrap();
        let poll: Poll = row.into();
        assert_eq!(poll.id, "p1");
        assert_eq!(poll.options, options(&["a", "b"]));
    }
}
