//! Per-frame protocol state
//!
//! Every frame walks Idle → Acquiring → Submitting → Presenting → Idle. Once a
//! close has been observed the context goes Idle → Draining → Terminated and
//! never renders again.

use super::error::GraphicsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Acquiring,
    Submitting,
    Presenting,
    Draining,
    Terminated,
}

impl FramePhase {
    /// The phase that follows `self`. `close_requested` only matters when idle.
    pub fn next(self, close_requested: bool) -> FramePhase {
        match self {
            FramePhase::Idle if close_requested => FramePhase::Draining,
            FramePhase::Idle => FramePhase::Acquiring,
            FramePhase::Acquiring => FramePhase::Submitting,
            FramePhase::Submitting => FramePhase::Presenting,
            FramePhase::Presenting => FramePhase::Idle,
            FramePhase::Draining | FramePhase::Terminated => FramePhase::Terminated,
        }
    }
}

/// Tracks the current phase and how many frames reached the screen.
#[derive(Debug, Clone)]
pub struct FrameTracker {
    phase: FramePhase,
    frames_presented: u64,
}

impl Default for FrameTracker {
    fn default() -> Self {
        Self {
            phase: FramePhase::Idle,
            frames_presented: 0,
        }
    }
}

impl FrameTracker {
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Moves to `to`, rejecting anything the protocol does not allow.
    pub fn enter(&mut self, to: FramePhase) -> Result<(), GraphicsError> {
        let close_requested = to == FramePhase::Draining;
        if self.phase.next(close_requested) != to {
            return Err(GraphicsError::InvalidFrameTransition {
                from: self.phase,
                to,
            });
        }
        if self.phase == FramePhase::Presenting {
            self.frames_presented += 1;
        }
        self.phase = to;
        Ok(())
    }

    /// Leaves a frame that failed midway; the tracker stays usable for draining.
    pub fn abort(&mut self) {
        if !matches!(self.phase, FramePhase::Draining | FramePhase::Terminated) {
            self.phase = FramePhase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn frame_cycle_returns_to_idle() {
        let mut phase = FramePhase::Idle;
        let mut seen = vec![phase];
        for _ in 0..4 {
            phase = phase.next(false);
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                FramePhase::Idle,
                FramePhase::Acquiring,
                FramePhase::Submitting,
                FramePhase::Presenting,
                FramePhase::Idle,
            ]
        );
    }

    #[test]
    fn close_is_only_observed_when_idle() {
        assert_eq!(FramePhase::Idle.next(true), FramePhase::Draining);
        assert_eq!(FramePhase::Acquiring.next(true), FramePhase::Submitting);
        assert_eq!(FramePhase::Draining.next(false), FramePhase::Terminated);
        assert_eq!(FramePhase::Terminated.next(true), FramePhase::Terminated);
    }

    #[test]
    fn tracker_counts_presented_frames() {
        let mut tracker = FrameTracker::default();
        for _ in 0..2 {
            tracker.enter(FramePhase::Acquiring).unwrap();
            tracker.enter(FramePhase::Submitting).unwrap();
            tracker.enter(FramePhase::Presenting).unwrap();
            tracker.enter(FramePhase::Idle).unwrap();
        }
        tracker.enter(FramePhase::Draining).unwrap();
        tracker.enter(FramePhase::Terminated).unwrap();

        assert_eq!(tracker.frames_presented(), 2);
        assert_eq!(tracker.phase(), FramePhase::Terminated);
    }

    #[test]
    fn tracker_rejects_skipped_phases() {
        let mut tracker = FrameTracker::default();
        let err = tracker.enter(FramePhase::Presenting).unwrap_err();
        assert_eq!(
            err,
            GraphicsError::InvalidFrameTransition {
                from: FramePhase::Idle,
                to: FramePhase::Presenting,
            }
        );

        tracker.enter(FramePhase::Acquiring).unwrap();
        assert!(tracker.enter(FramePhase::Draining).is_err());
    }

    #[test]
    fn no_frames_after_termination() {
        let mut tracker = FrameTracker::default();
        tracker.enter(FramePhase::Draining).unwrap();
        tracker.enter(FramePhase::Terminated).unwrap();
        assert!(tracker.enter(FramePhase::Acquiring).is_err());
    }

    #[test]
    fn abort_returns_to_idle_without_counting() {
        let mut tracker = FrameTracker::default();
        tracker.enter(FramePhase::Acquiring).unwrap();
        tracker.abort();
        assert_eq!(tracker.phase(), FramePhase::Idle);
        assert_eq!(tracker.frames_presented(), 0);
    }
}
