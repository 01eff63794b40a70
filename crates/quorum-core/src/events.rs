use tokio::sync::broadcast;

/// Path of the view listing a user's polls.
pub const POLLS_PATH: &str = "/polls";

pub fn poll_results_path(poll_id: &str) -> String {
    format!("{POLLS_PATH}/{poll_id}/results")
}

/// Signals that the rendering of `path` is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub path: String,
    /// Owner whose view changed, when the path is per-user.
    pub user_id: Option<String>,
}

impl Invalidation {
    pub fn poll_listing(user_id: &str) -> Self {
        Self {
            path: POLLS_PATH.to_string(),
            user_id: Some(user_id.to_string()),
        }
    }

    pub fn poll_results(poll_id: &str) -> Self {
        Self {
            path: poll_results_path(poll_id),
            user_id: None,
        }
    }
}

/// Broadcast of cache invalidations. Publishing never blocks and never fails;
/// with no subscribers the signal is dropped.
#[derive(Clone)]
pub struct InvalidationBus {
    sender: broadcast::Sender<Invalidation>,
}

impl InvalidationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(16));
        Self { sender }
    }

    pub fn publish(&self, invalidation: Invalidation) {
        tracing::debug!(path = %invalidation.path, "invalidating");
        let _ = self.sender.send(invalidation);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.sender.subscribe()
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new(256)
    }
}
