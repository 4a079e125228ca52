//! Hardware abstraction boundary.
//!
//! Contracts for the external collaborators the controller drives: device
//! enumeration, the asynchronous session driver, the recorder, and the still
//! sink. Every driver call returns immediately; outcomes arrive later as
//! [`Signal`](crate::session::Signal)s fed back by the host on the single
//! callback sequence.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::CaptureError;
use crate::transform::Transform;
use crate::types::{Facing, FlashMode, Size};

pub type DeviceId = String;

/// Hardware capability tier reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HardwareTier {
    Legacy,
    Limited,
    Full,
    Level3,
}

/// Autofocus modes the device may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfMode {
    Off,
    Auto,
    Macro,
    ContinuousVideo,
    ContinuousPicture,
    Edof,
}

/// Auto-exposure mode carried in capture requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AeMode {
    On,
    OnAlwaysFlash,
    OnAutoFlash,
    OnAutoFlashRedeye,
}

/// One-shot trigger field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    Start,
    Cancel,
}

/// Autofocus convergence state reported in metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfState {
    Inactive,
    PassiveScan,
    PassiveFocused,
    PassiveUnfocused,
    ActiveScan,
    FocusedLocked,
    NotFocusedLocked,
}

/// Auto-exposure convergence state reported in metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AeState {
    Inactive,
    Searching,
    Converged,
    Locked,
    FlashRequired,
    Precapture,
}

/// One metadata snapshot from the repeating stream. Either field may be
/// absent on any given snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub af: Option<AfState>,
    pub ae: Option<AeState>,
}

impl MetadataSnapshot {
    pub fn new(af: Option<AfState>, ae: Option<AeState>) -> Self {
        Self { af, ae }
    }
}

/// Which output stream a size list applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCase {
    Preview,
    StillJpeg,
    VideoRecord,
}

/// Static capability report for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCharacteristics {
    pub facing: Facing,
    /// Sensor mount angle in degrees; absent on broken devices, which is
    /// treated as fatal at open.
    pub sensor_orientation: Option<u16>,
    pub tier: HardwareTier,
    pub vendor: String,
    pub preview_sizes: Vec<Size>,
    pub photo_sizes: Vec<Size>,
    pub video_sizes: Vec<Size>,
    pub af_modes: Vec<AfMode>,
}

impl DeviceCharacteristics {
    pub fn sizes_for(&self, use_case: UseCase) -> &[Size] {
        match use_case {
            UseCase::Preview => &self.preview_sizes,
            UseCase::StillJpeg => &self.photo_sizes,
            UseCase::VideoRecord => &self.video_sizes,
        }
    }
}

/// Synchronous device enumeration and metadata.
pub trait DeviceProvider: Send {
    fn list_devices(&self) -> Vec<DeviceId>;
    fn characteristics(&self, id: &str) -> Result<DeviceCharacteristics, CaptureError>;
}

/// Request template hinting the pipeline tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestTemplate {
    Preview,
    Record,
    StillCapture,
}

/// Output targets a request draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Preview,
    StillSink,
    Recorder,
}

/// A capture request: template plus the control fields the core manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    pub targets: Vec<TargetKind>,
    pub af_mode: AfMode,
    pub af_trigger: Option<Trigger>,
    pub ae_mode: AeMode,
    pub flash_torch: bool,
    pub ae_precapture_trigger: Option<Trigger>,
    /// JPEG rotation tag for still captures.
    pub jpeg_rotation: Option<u16>,
}

impl CaptureRequest {
    pub fn new(template: RequestTemplate, targets: Vec<TargetKind>) -> Self {
        Self {
            template,
            targets,
            af_mode: AfMode::Off,
            af_trigger: None,
            ae_mode: AeMode::On,
            flash_torch: false,
            ae_precapture_trigger: None,
            jpeg_rotation: None,
        }
    }

    /// Applies the preview AE/torch fields for a flash mode.
    pub fn apply_flash(&mut self, flash: FlashMode) {
        let (ae_mode, torch) = match flash {
            FlashMode::Off => (AeMode::On, false),
            FlashMode::On => (AeMode::OnAlwaysFlash, false),
            FlashMode::Torch => (AeMode::On, true),
            FlashMode::Auto => (AeMode::OnAutoFlash, false),
            FlashMode::RedEye => (AeMode::OnAutoFlashRedeye, false),
        };
        self.ae_mode = ae_mode;
        self.flash_torch = torch;
    }

    /// Applies the still-capture AE/torch fields for a flash mode. Red-eye
    /// stills meter as plain auto flash; the reduction pass belongs to the
    /// preview request.
    pub fn apply_still_flash(&mut self, flash: FlashMode) {
        let (ae_mode, torch) = match flash {
            FlashMode::Off => (AeMode::On, false),
            FlashMode::On => (AeMode::OnAlwaysFlash, false),
            FlashMode::Torch => (AeMode::On, true),
            FlashMode::Auto | FlashMode::RedEye => (AeMode::OnAutoFlash, false),
        };
        self.ae_mode = ae_mode;
        self.flash_torch = torch;
    }
}

/// Parameters handed to the recorder collaborator before a video session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderSettings {
    pub size: Size,
    pub bit_rate: u32,
    pub frame_rate: u32,
    pub output_path: PathBuf,
    pub orientation_hint: u16,
}

/// The asynchronous device driver. Calls return once the operation is
/// submitted; completion (opened, configured, closed, metadata) is delivered
/// by the host as signals. An `Err` here means the submission itself was
/// rejected, e.g. mid-teardown.
pub trait CaptureHal: Send {
    fn open_device(&mut self, id: &str) -> Result<(), CaptureError>;
    fn close_device(&mut self);
    fn configure_session(
        &mut self,
        generation: u64,
        targets: &[TargetKind],
    ) -> Result<(), CaptureError>;
    fn close_session(&mut self, generation: u64);
    fn submit_repeating(&mut self, request: &CaptureRequest) -> Result<(), CaptureError>;
    fn submit_once(&mut self, request: &CaptureRequest) -> Result<(), CaptureError>;
    fn stop_repeating(&mut self);
    /// Sizes the preview buffer on the stream target.
    fn set_preview_buffer_size(&mut self, size: Size);
    /// Hands the planned transform to the rendering collaborator.
    fn publish_transform(&mut self, transform: Transform);
    fn prepare_still_sink(&mut self, size: Size) -> Result<(), CaptureError>;
    fn release_still_sink(&mut self);
    fn prepare_recorder(&mut self, settings: &RecorderSettings) -> Result<(), CaptureError>;
    fn start_recorder(&mut self) -> Result<(), CaptureError>;
    fn stop_recorder(&mut self) -> Result<(), CaptureError>;
    fn reset_recorder(&mut self);
    fn release_recorder(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_mapping_preview() {
        let mut request = CaptureRequest::new(RequestTemplate::Preview, vec![TargetKind::Preview]);
        request.apply_flash(FlashMode::Torch);
        assert_eq!(request.ae_mode, AeMode::On);
        assert!(request.flash_torch);

        request.apply_flash(FlashMode::RedEye);
        assert_eq!(request.ae_mode, AeMode::OnAutoFlashRedeye);
        assert!(!request.flash_torch);
    }

    #[test]
    fn test_flash_mapping_still_redeye_meters_as_auto() {
        let mut request =
            CaptureRequest::new(RequestTemplate::StillCapture, vec![TargetKind::StillSink]);
        request.apply_still_flash(FlashMode::RedEye);
        assert_eq!(request.ae_mode, AeMode::OnAutoFlash);
    }

    #[test]
    fn test_characteristics_sizes_by_use_case() {
        let chars = DeviceCharacteristics {
            facing: Facing::Back,
            sensor_orientation: Some(90),
            tier: HardwareTier::Full,
            vendor: "acme".to_string(),
            preview_sizes: vec![Size::new(1280, 720)],
            photo_sizes: vec![Size::new(4000, 3000)],
            video_sizes: vec![Size::new(1920, 1080)],
            af_modes: vec![AfMode::Auto],
        };
        assert_eq!(chars.sizes_for(UseCase::StillJpeg), &[Size::new(4000, 3000)]);
        assert_eq!(chars.sizes_for(UseCase::Preview), &[Size::new(1280, 720)]);
    }
}
