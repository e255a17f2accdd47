use std::sync::{Arc, Mutex};

use aivis_core::PlatformId;

/// Snapshot handed to the progress callback after each completed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub last_platform: Option<PlatformId>,
}

pub type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// Shared completion counter.
///
/// The callback runs while the counter lock is held, so invocations never
/// overlap and `completed` is observed strictly increasing.
pub struct ProgressTracker {
    total: usize,
    completed: Mutex<usize>,
    callback: ProgressFn,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(total: usize, callback: ProgressFn) -> Self {
        Self {
            total,
            completed: Mutex::new(0),
            callback,
        }
    }

    /// A tracker that reports nowhere.
    #[must_use]
    pub fn silent(total: usize) -> Self {
        Self::new(total, Arc::new(|_| {}))
    }

    pub fn record(&self, platform: PlatformId) {
        // A panicking callback must not wedge the remaining workers.
        let mut completed = self
            .completed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *completed += 1;
        (self.callback)(Progress {
            completed: *completed,
            total: self.total,
            last_platform: Some(platform),
        });
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        *self
            .completed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_reports_running_count() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tracker = ProgressTracker::new(
            3,
            Arc::new(move |p: Progress| sink.lock().unwrap().push(p.completed)),
        );

        tracker.record(PlatformId::OpenAi);
        tracker.record(PlatformId::Gemini);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(tracker.completed(), 2);
        assert_eq!(tracker.total(), 3);
    }

    #[test]
    fn silent_tracker_still_counts() {
        let tracker = ProgressTracker::silent(1);
        tracker.record(PlatformId::Perplexity);
        assert_eq!(tracker.completed(), 1);
    }
}
