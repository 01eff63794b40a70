use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub poll_id: String,
    /// `None` for anonymous votes.
    pub user_id: Option<String>,
    pub option_index: i64,
    pub created_at: DateTime<Utc>,
}
