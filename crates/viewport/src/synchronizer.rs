use tracing::debug;

use crate::target::CameraTarget;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FramingState {
    Idle,
    Framing { until_ms: u64 },
}

/// Tracks whether a camera transition is in progress.
///
/// Two states only. A trigger while framing preempts the in-flight
/// transition (last request wins, no queue); once the transition duration
/// elapses the synchronizer returns to idle on the next tick.
#[derive(Debug)]
pub struct ViewportSynchronizer {
    state: FramingState,
}

impl ViewportSynchronizer {
    pub fn new() -> Self {
        Self {
            state: FramingState::Idle,
        }
    }

    pub fn state(&self) -> FramingState {
        self.state
    }

    pub fn is_framing(&self) -> bool {
        matches!(self.state, FramingState::Framing { .. })
    }

    /// Start (or preempt into) a transition toward `target`.
    pub fn begin(&mut self, target: &CameraTarget, now_ms: u64) {
        if let FramingState::Framing { until_ms } = self.state {
            debug!(until_ms, "preempting in-flight camera transition");
        }
        self.state = FramingState::Framing {
            until_ms: now_ms + target.duration_ms as u64,
        };
    }

    /// Advance time; returns to idle once the transition has elapsed.
    pub fn tick(&mut self, now_ms: u64) {
        if let FramingState::Framing { until_ms } = self.state
            && now_ms >= until_ms
        {
            self.state = FramingState::Idle;
        }
    }
}

impl Default for ViewportSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{FramingState, ViewportSynchronizer};
    use crate::target::CameraTarget;
    use foundation::LonLat;

    fn target(duration_ms: u32) -> CameraTarget {
        CameraTarget {
            center: LonLat::new(0.0, 0.0),
            altitude_m: 500_000.0,
            duration_ms,
        }
    }

    #[test]
    fn transition_elapses_back_to_idle() {
        let mut sync = ViewportSynchronizer::new();
        assert!(!sync.is_framing());

        sync.begin(&target(1_500), 0);
        assert_eq!(sync.state(), FramingState::Framing { until_ms: 1_500 });

        sync.tick(1_000);
        assert!(sync.is_framing());
        sync.tick(1_500);
        assert!(!sync.is_framing());
        // Idle re-entry is idempotent.
        sync.tick(2_000);
        assert!(!sync.is_framing());
    }

    #[test]
    fn second_trigger_preempts_instead_of_queuing() {
        let mut sync = ViewportSynchronizer::new();
        sync.begin(&target(1_500), 0);
        sync.begin(&target(2_000), 500);
        // The first transition's deadline is gone; only the second counts.
        assert_eq!(sync.state(), FramingState::Framing { until_ms: 2_500 });
        sync.tick(1_500);
        assert!(sync.is_framing());
        sync.tick(2_500);
        assert!(!sync.is_framing());
    }
}
