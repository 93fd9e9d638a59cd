use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_NOTICE_WINDOW: Duration = Duration::from_secs(3);

/// Suppresses a user-facing message repeated within a bounded window.
///
/// Owned by whoever renders notices; time is always passed in.
#[derive(Debug, Clone)]
pub struct NoticeLog {
    window: Duration,
    seen: HashMap<String, Instant>,
}

impl NoticeLog {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// Returns true if `message` should be shown at `now`.
    pub fn admit(&mut self, message: &str, now: Instant) -> bool {
        let window = self.window;
        self.seen
            .retain(|_, shown_at| now.saturating_duration_since(*shown_at) < window);
        if self.seen.contains_key(message) {
            return false;
        }
        self.seen.insert(message.to_owned(), now);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_WINDOW)
    }
}
