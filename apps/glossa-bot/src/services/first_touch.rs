use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Remembers which user ids this process has already greeted.
///
/// Purely in-memory: a restart forgets everyone, so "first time" is only
/// meaningful within a single process uptime window. That is accepted,
/// the flag feeds an admin-channel log line, nothing billing-critical.
#[derive(Clone, Default)]
pub struct FirstTouchTracker {
    seen: Arc<Mutex<HashSet<i64>>>,
}

impl FirstTouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-and-insert in one locked step, so two racing /start events for
    /// the same user cannot both be counted as the first one. Returns true
    /// iff this is the first observation of `user_id`.
    pub async fn observe(&self, user_id: i64) -> bool {
        self.seen.lock().await.insert(user_id)
    }

    /// Clears all tracked ids. Test and maintenance use only.
    pub async fn reset(&self) {
        self.seen.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_observation_only_counts_once() {
        let tracker = FirstTouchTracker::new();
        assert!(tracker.observe(42).await);
        assert!(!tracker.observe(42).await);
        assert!(!tracker.observe(42).await);
        assert!(tracker.observe(7).await);
    }

    #[tokio::test]
    async fn reset_forgets_everyone() {
        let tracker = FirstTouchTracker::new();
        assert!(tracker.observe(42).await);
        tracker.reset().await;
        assert!(tracker.observe(42).await);
    }

    #[tokio::test]
    async fn concurrent_observations_count_a_user_exactly_once() {
        let tracker = FirstTouchTracker::new();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move { tracker.observe(42).await }));
        }

        let mut first_count = 0;
        for handle in handles {
            if handle.await.expect("observe task panicked") {
                first_count += 1;
            }
        }
        assert_eq!(first_count, 1);
    }
}
