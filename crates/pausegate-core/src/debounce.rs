//! Suppresses duplicate rapid activations.

/// Minimum gap between two accepted inputs.
pub const DEFAULT_DEBOUNCE_MS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Debounce {
    min_interval_ms: u64,
    last_accepted_ms: Option<u64>,
}

impl Debounce {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_accepted_ms: None,
        }
    }

    /// Accept the input at `now_ms` unless the previous accepted input was
    /// less than the minimum interval ago. Only accepted inputs move the
    /// window.
    pub fn should_accept(&mut self, now_ms: u64) -> bool {
        if let Some(last) = self.last_accepted_ms {
            if now_ms.saturating_sub(last) < self.min_interval_ms {
                return false;
            }
        }
        self.last_accepted_ms = Some(now_ms);
        true
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_input_is_accepted() {
        let mut debounce = Debounce::default();
        assert!(debounce.should_accept(0));
    }

    #[test]
    fn rejects_inside_window() {
        let mut debounce = Debounce::default();
        assert!(debounce.should_accept(1_000));
        assert!(!debounce.should_accept(1_000));
        assert!(!debounce.should_accept(1_059));
        assert!(debounce.should_accept(1_060));
    }

    #[test]
    fn rejected_inputs_do_not_extend_window() {
        let mut debounce = Debounce::default();
        assert!(debounce.should_accept(0));
        assert!(!debounce.should_accept(50));
        assert!(debounce.should_accept(60));
    }

    #[test]
    fn zero_interval_accepts_everything() {
        let mut debounce = Debounce::new(0);
        assert!(debounce.should_accept(5));
        assert!(debounce.should_accept(5));
    }
}
