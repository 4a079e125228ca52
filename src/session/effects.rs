//! Effects emitted by the controller and signals delivered back to it.
//!
//! The controller never calls the hardware directly: every transition
//! returns a list of [`Effect`]s the driver executes in order, and every
//! asynchronous outcome comes back as a [`Signal`] on the same sequence.

use crate::hal::{CaptureRequest, DeviceId, MetadataSnapshot, RecorderSettings, TargetKind};
use crate::transform::Transform;
use crate::types::{Size, StreamTarget};

/// A side effect the driver layer must perform against the hardware.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    OpenDevice(DeviceId),
    CloseDevice,
    ConfigureSession {
        generation: u64,
        targets: Vec<TargetKind>,
    },
    CloseSession {
        generation: u64,
    },
    SubmitRepeating(CaptureRequest),
    SubmitOnce(CaptureRequest),
    StopRepeating,
    SetPreviewBufferSize(Size),
    PublishTransform(Transform),
    PrepareStillSink(Size),
    ReleaseStillSink,
    PrepareRecorder(RecorderSettings),
    StartRecorder,
    StopRecorder,
    ReleaseRecorder,
}

/// An asynchronous outcome or external event delivered to the controller.
///
/// Session-scoped signals carry the generation of the session they belong
/// to; the controller discards stale ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    DeviceOpened,
    DeviceDisconnected,
    DeviceError(String),
    SessionConfigured { generation: u64 },
    SessionConfigureFailed { generation: u64 },
    SessionClosed { generation: u64 },
    /// A stream target appeared or changed dimensions.
    TargetAvailable(StreamTarget),
    TargetDestroyed,
    Metadata(MetadataSnapshot),
    /// The driver failed to arm an updated repeating request.
    RepeatingRejected,
    /// The one-shot still capture finished.
    StillCompleted,
    RecorderStopped { ok: bool },
}
