//! Controller lifecycle state.

/// Where the controller is in the open/configure/capture lifecycle.
///
/// Session-bearing variants carry the generation of the session they refer
/// to; async completions are matched against it so signals for a superseded
/// session are discarded instead of corrupting newer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Closed,
    /// Device open requested, not yet signaled.
    Opening,
    /// Device open, no session configured.
    Open,
    SessionBuilding { generation: u64 },
    SessionActive { generation: u64 },
    /// Repeating stopped for a one-shot still capture.
    Capturing { generation: u64 },
}

impl ControllerState {
    /// Generation of the session this state refers to, if any.
    pub fn generation(&self) -> Option<u64> {
        match self {
            ControllerState::SessionBuilding { generation }
            | ControllerState::SessionActive { generation }
            | ControllerState::Capturing { generation } => Some(*generation),
            _ => None,
        }
    }

    /// True once the device-open signal has arrived.
    pub fn device_open(&self) -> bool {
        !matches!(self, ControllerState::Closed | ControllerState::Opening)
    }
}
