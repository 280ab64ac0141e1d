use std::time::{Duration, Instant};

/// Quiet period after the last mutation before a debounced write happens.
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(1000);

/// Dirty flag plus debounce timing for persistence writes.
///
/// Mutations call [`FlushScheduler::mark_dirty_at`]; the owner polls
/// [`FlushScheduler::is_due_at`] from its event loop tick and writes once
/// the state has been quiet for the configured interval. Several rapid
/// mutations therefore coalesce into one write.
#[derive(Debug, Clone)]
pub struct FlushScheduler {
    quiet: Duration,
    last_mutation: Option<Instant>,
}

impl FlushScheduler {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_mutation: None,
        }
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet
    }

    pub fn mark_dirty(&mut self) {
        self.mark_dirty_at(Instant::now());
    }

    pub fn mark_dirty_at(&mut self, now: Instant) {
        self.last_mutation = Some(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.last_mutation.is_some()
    }

    pub fn is_due_at(&self, now: Instant) -> bool {
        match self.last_mutation {
            Some(at) => now.saturating_duration_since(at) >= self.quiet,
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.last_mutation = None;
    }
}

impl Default for FlushScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_scheduler_is_never_due() {
        let scheduler = FlushScheduler::default();
        assert!(!scheduler.is_dirty());
        assert!(!scheduler.is_due_at(Instant::now() + Duration::from_secs(60)));
    }

    #[test]
    fn due_only_after_quiet_interval() {
        let start = Instant::now();
        let mut scheduler = FlushScheduler::new(Duration::from_millis(100));
        scheduler.mark_dirty_at(start);

        assert!(!scheduler.is_due_at(start + Duration::from_millis(50)));
        assert!(scheduler.is_due_at(start + Duration::from_millis(100)));
    }

    #[test]
    fn later_mutation_pushes_deadline_back() {
        let start = Instant::now();
        let mut scheduler = FlushScheduler::new(Duration::from_millis(100));
        scheduler.mark_dirty_at(start);
        scheduler.mark_dirty_at(start + Duration::from_millis(80));

        assert!(!scheduler.is_due_at(start + Duration::from_millis(120)));
        assert!(scheduler.is_due_at(start + Duration::from_millis(180)));

        scheduler.clear();
        assert!(!scheduler.is_dirty());
    }
}
