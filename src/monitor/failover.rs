//! Active pool tracking.
//!
//! # State Transitions
//! ```text
//! Unset       --observe(p)-->          Tracking(p)   (baseline, no signal)
//! Tracking(p) --observe(p)-->          Tracking(p)
//! Tracking(p) --observe(q), q != p-->  Tracking(q)   (Failover { from: p, to: q })
//! ```
//!
//! Pool names are compared as literal strings; an empty pool is a pool.

/// Detector state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PoolState {
    #[default]
    Unset,
    Tracking(String),
}

/// A change of active pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failover {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default)]
pub struct FailoverDetector {
    state: PoolState,
}

impl FailoverDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the pool from one record.
    pub fn observe(&mut self, pool: &str) -> Option<Failover> {
        match &mut self.state {
            PoolState::Tracking(current) if current.as_str() == pool => None,
            PoolState::Tracking(current) => {
                let from = std::mem::replace(current, pool.to_string());
                Some(Failover {
                    from,
                    to: pool.to_string(),
                })
            }
            PoolState::Unset => {
                self.state = PoolState::Tracking(pool.to_string());
                None
            }
        }
    }

    /// Last observed pool.
    pub fn current_pool(&self) -> Option<&str> {
        match &self.state {
            PoolState::Unset => None,
            PoolState::Tracking(pool) => Some(pool),
        }
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_pool_is_baseline() {
        let mut detector = FailoverDetector::new();
        assert_eq!(detector.observe("blue"), None);
        assert_eq!(detector.current_pool(), Some("blue"));
    }

    #[test]
    fn test_blue_blue_green() {
        let mut detector = FailoverDetector::new();
        assert_eq!(detector.observe("blue"), None);
        assert_eq!(detector.observe("blue"), None);
        assert_eq!(
            detector.observe("green"),
            Some(Failover {
                from: "blue".into(),
                to: "green".into()
            })
        );
        assert_eq!(detector.state(), &PoolState::Tracking("green".into()));
    }

    #[test]
    fn test_empty_pool_is_a_change() {
        let mut detector = FailoverDetector::new();
        detector.observe("blue");
        let failover = detector.observe("").unwrap();
        assert_eq!(failover.from, "blue");
        assert_eq!(failover.to, "");
        assert_eq!(detector.observe("blue").unwrap().from, "");
    }

    #[test]
    fn test_no_signal_on_first_pool_for_any_sequence() {
        for first in ["blue", "green", "", "pool-a"] {
            let mut detector = FailoverDetector::new();
            assert_eq!(detector.observe(first), None);
        }
    }
}
