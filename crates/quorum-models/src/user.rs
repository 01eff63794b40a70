use serde::{Deserialize, Serialize};

/// Identity of the caller as vouched for by the identity provider.
///
/// Users are never stored locally; this is rebuilt from the session token on
/// every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
}
