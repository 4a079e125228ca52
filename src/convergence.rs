//! Focus/exposure convergence protocol for still capture.
//!
//! A pure state machine fed with metadata snapshots from the repeating
//! stream. It never touches the device; it only tells the controller what to
//! do next: retry the focus lock, run the precapture sequence, or proceed to
//! the final capture.

use crate::hal::{AeState, AfState, MetadataSnapshot};

/// Focus-lock retries are bounded so a lens that cannot lock still produces
/// a capture instead of retrying forever.
pub const MAX_LOCK_ATTEMPTS: u32 = 3;

/// Where the protocol currently is in the still-capture sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusStage {
    /// Idle; repeating preview runs, snapshots are ignored.
    Preview,
    /// A focus-lock trigger was issued; waiting for the lens to settle.
    Locking,
    /// Focus settled but exposure has not converged; precapture is pending.
    Locked,
    /// Precapture trigger issued; waiting for the sequence to start.
    Precapture,
    /// Precapture running; waiting for exposure to leave the sequence.
    WaitingExposure,
    /// Final capture submitted; snapshots are ignored.
    Capturing,
}

/// What the controller must do in response to a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceAction {
    /// Focus and exposure are acceptable; submit the still capture.
    Proceed,
    /// Exposure needs the precapture sequence before capturing.
    RequirePrecapture,
    /// Focus did not lock; re-issue the lock trigger.
    RetryFocusLock,
}

#[derive(Debug)]
pub struct FocusConvergence {
    stage: FocusStage,
    lock_attempts: u32,
}

impl Default for FocusConvergence {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusConvergence {
    pub fn new() -> Self {
        Self {
            stage: FocusStage::Preview,
            lock_attempts: 0,
        }
    }

    pub fn stage(&self) -> FocusStage {
        self.stage
    }

    pub fn lock_attempts(&self) -> u32 {
        self.lock_attempts
    }

    /// Enters `Locking`. The retry counter is cleared by [`reset`], not here:
    /// a retry re-enters the lock without forgiving past attempts.
    pub fn begin_lock(&mut self) {
        self.stage = FocusStage::Locking;
    }

    /// Back to idle with a cleared retry counter. Called when a still-capture
    /// sequence starts or completes.
    pub fn reset(&mut self) {
        self.stage = FocusStage::Preview;
        self.lock_attempts = 0;
    }

    /// Moves `Locked` to `Precapture` once the controller has submitted the
    /// precapture trigger.
    pub fn note_precapture_started(&mut self) {
        if self.stage == FocusStage::Locked {
            self.stage = FocusStage::Precapture;
        }
    }

    /// Consumes one metadata snapshot and possibly emits an action.
    pub fn observe(&mut self, snapshot: &MetadataSnapshot) -> Option<ConvergenceAction> {
        match self.stage {
            FocusStage::Locking => {
                let af = snapshot.af?;
                let focused = af == AfState::FocusedLocked;
                let not_focused = af == AfState::NotFocusedLocked;
                if focused || (not_focused && self.lock_attempts >= MAX_LOCK_ATTEMPTS) {
                    match snapshot.ae {
                        None | Some(AeState::Converged) => {
                            self.stage = FocusStage::Capturing;
                            Some(ConvergenceAction::Proceed)
                        }
                        Some(_) => {
                            self.stage = FocusStage::Locked;
                            Some(ConvergenceAction::RequirePrecapture)
                        }
                    }
                } else if not_focused {
                    self.lock_attempts += 1;
                    Some(ConvergenceAction::RetryFocusLock)
                } else {
                    // Still scanning.
                    None
                }
            }
            FocusStage::Precapture => {
                match snapshot.ae {
                    None
                    | Some(AeState::Precapture)
                    | Some(AeState::FlashRequired)
                    | Some(AeState::Converged) => {
                        self.stage = FocusStage::WaitingExposure;
                    }
                    Some(_) => {}
                }
                None
            }
            FocusStage::WaitingExposure => match snapshot.ae {
                Some(AeState::Precapture) => None,
                _ => {
                    self.stage = FocusStage::Capturing;
                    Some(ConvergenceAction::Proceed)
                }
            },
            FocusStage::Preview | FocusStage::Locked | FocusStage::Capturing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(af: Option<AfState>, ae: Option<AeState>) -> MetadataSnapshot {
        MetadataSnapshot::new(af, ae)
    }

    fn locking() -> FocusConvergence {
        let mut protocol = FocusConvergence::new();
        protocol.begin_lock();
        protocol
    }

    #[test]
    fn test_focused_and_converged_proceeds_directly() {
        let mut protocol = locking();
        let action = protocol.observe(&snapshot(
            Some(AfState::FocusedLocked),
            Some(AeState::Converged),
        ));
        assert_eq!(action, Some(ConvergenceAction::Proceed));
        assert_eq!(protocol.stage(), FocusStage::Capturing);
    }

    #[test]
    fn test_focused_with_absent_exposure_proceeds() {
        let mut protocol = locking();
        let action = protocol.observe(&snapshot(Some(AfState::FocusedLocked), None));
        assert_eq!(action, Some(ConvergenceAction::Proceed));
    }

    #[test]
    fn test_absent_af_is_ignored_while_locking() {
        let mut protocol = locking();
        assert_eq!(protocol.observe(&snapshot(None, Some(AeState::Converged))), None);
        assert_eq!(protocol.stage(), FocusStage::Locking);
    }

    #[test]
    fn test_scanning_af_emits_nothing() {
        let mut protocol = locking();
        assert_eq!(
            protocol.observe(&snapshot(Some(AfState::ActiveScan), None)),
            None
        );
        assert_eq!(protocol.stage(), FocusStage::Locking);
    }

    #[test]
    fn test_three_retries_then_accepts_imperfect_focus() {
        let mut protocol = locking();
        for attempt in 1..=3 {
            let action = protocol.observe(&snapshot(Some(AfState::NotFocusedLocked), None));
            assert_eq!(action, Some(ConvergenceAction::RetryFocusLock));
            assert_eq!(protocol.lock_attempts(), attempt);
            assert_eq!(protocol.stage(), FocusStage::Locking);
        }
        // Fourth failure: retries exhausted, current focus is accepted.
        let action = protocol.observe(&snapshot(Some(AfState::NotFocusedLocked), None));
        assert_eq!(action, Some(ConvergenceAction::Proceed));
        assert_eq!(protocol.stage(), FocusStage::Capturing);
    }

    #[test]
    fn test_precapture_sequence_to_capture() {
        let mut protocol = locking();
        let action = protocol.observe(&snapshot(
            Some(AfState::FocusedLocked),
            Some(AeState::Precapture),
        ));
        assert_eq!(action, Some(ConvergenceAction::RequirePrecapture));
        assert_eq!(protocol.stage(), FocusStage::Locked);

        protocol.note_precapture_started();
        assert_eq!(protocol.stage(), FocusStage::Precapture);

        assert_eq!(
            protocol.observe(&snapshot(None, Some(AeState::Converged))),
            None
        );
        assert_eq!(protocol.stage(), FocusStage::WaitingExposure);

        let action = protocol.observe(&snapshot(None, None));
        assert_eq!(action, Some(ConvergenceAction::Proceed));
        assert_eq!(protocol.stage(), FocusStage::Capturing);
    }

    #[test]
    fn test_waiting_exposure_holds_while_precapture_active() {
        let mut protocol = locking();
        protocol.observe(&snapshot(
            Some(AfState::FocusedLocked),
            Some(AeState::Searching),
        ));
        protocol.note_precapture_started();
        protocol.observe(&snapshot(None, Some(AeState::Precapture)));
        assert_eq!(protocol.stage(), FocusStage::WaitingExposure);

        assert_eq!(
            protocol.observe(&snapshot(None, Some(AeState::Precapture))),
            None
        );
        assert_eq!(protocol.stage(), FocusStage::WaitingExposure);
    }

    #[test]
    fn test_reset_clears_retry_counter() {
        let mut protocol = locking();
        protocol.observe(&snapshot(Some(AfState::NotFocusedLocked), None));
        assert_eq!(protocol.lock_attempts(), 1);
        protocol.reset();
        assert_eq!(protocol.lock_attempts(), 0);
        assert_eq!(protocol.stage(), FocusStage::Preview);
    }

    #[test]
    fn test_idle_stages_ignore_snapshots() {
        let mut protocol = FocusConvergence::new();
        assert_eq!(
            protocol.observe(&snapshot(Some(AfState::FocusedLocked), None)),
            None
        );
        protocol.begin_lock();
        protocol.observe(&snapshot(Some(AfState::FocusedLocked), None));
        assert_eq!(protocol.stage(), FocusStage::Capturing);
        assert_eq!(
            protocol.observe(&snapshot(Some(AfState::FocusedLocked), None)),
            None
        );
    }
}
