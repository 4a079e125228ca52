use thiserror::Error;

/// Errors surfaced by the capture core.
///
/// Fatal variants (`NoDevice`, `MissingCapability`, `MissingSensorOrientation`)
/// abort an `open` and leave the device closed. `DeviceBusy` is transient:
/// the next triggering event resubmits naturally, so callers may drop it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("no camera devices available")]
    NoDevice,
    #[error("device {0} reports no usable stream configuration")]
    MissingCapability(String),
    #[error("device {0} reports no sensor orientation")]
    MissingSensorOrientation(String),
    #[error("size catalog is empty")]
    EmptyCatalog,
    #[error("aspect ratio {0} is not supported by the current device")]
    UnknownRatio(String),
    #[error("device busy: {0}")]
    DeviceBusy(String),
    #[error("parameter rejected by device: {0}")]
    ParameterRejected(String),
    #[error("recorder error: {0}")]
    Recorder(String),
    #[error("hardware layer error: {0}")]
    Hal(String),
    #[error("controller is closed")]
    Closed,
}
