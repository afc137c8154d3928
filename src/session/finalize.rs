use crate::engine::metrics::{self, Metrics};

/// One-shot latch guarding the Finished-entry action. The first call computes
/// the authoritative metrics; every later call reports that nothing happened.
#[derive(Debug, Default)]
pub struct FinalizationGuard {
    latched: Option<Metrics>,
}

impl FinalizationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some` only on the first call since the last reset.
    pub fn finalize(&mut self, typed: &[char], target: &[char], elapsed_secs: u32) -> Option<Metrics> {
        if self.latched.is_some() {
            return None;
        }
        let final_metrics = metrics::compute(typed, target, elapsed_secs);
        self.latched = Some(final_metrics);
        Some(final_metrics)
    }

    pub fn is_latched(&self) -> bool {
        self.latched.is_some()
    }

    pub fn metrics(&self) -> Option<Metrics> {
        self.latched
    }

    pub fn reset(&mut self) {
        self.latched = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_once_then_latches() {
        let target: Vec<char> = "stack".chars().collect();
        let mut guard = FinalizationGuard::new();
        let first = guard.finalize(&target, &target, 3);
        assert_eq!(first, Some(Metrics { wpm: 20, accuracy: 100.0 }));
        assert!(guard.is_latched());

        // Different inputs on re-entry must not overwrite the stored result.
        assert_eq!(guard.finalize(&['x'], &target, 90), None);
        assert_eq!(guard.metrics(), first);
    }

    #[test]
    fn reset_unlatches() {
        let mut guard = FinalizationGuard::new();
        guard.finalize(&[], &[], 0);
        guard.reset();
        assert!(!guard.is_latched());
        assert_eq!(guard.metrics(), None);
        assert!(guard.finalize(&[], &[], 0).is_some());
    }
}
