//! Capture session controller.
//!
//! Owns the device handle, the active session generation, and the repeating
//! request template. The controller is a state machine: host commands and
//! hardware signals go in, [`Effect`]s come out, and a thin driver layer
//! ([`SessionDirector`]) executes them. All mutation happens on the single
//! sequence that delivers hardware callbacks.

pub mod director;
pub mod effects;
pub mod state;

pub use director::{SessionDirector, SessionHandle};
pub use effects::{Effect, Signal};
pub use state::ControllerState;

use std::path::PathBuf;

use crate::convergence::{ConvergenceAction, FocusConvergence, FocusStage};
use crate::errors::CaptureError;
use crate::hal::{
    AfMode, CaptureRequest, DeviceCharacteristics, DeviceId, DeviceProvider, RecorderSettings,
    RequestTemplate, TargetKind, Trigger, UseCase,
};
use crate::policy::FocusModePolicy;
use crate::sizes::SizeCatalog;
use crate::transform::{self, Transform};
use crate::types::{
    AspectRatio, CameraMode, Facing, FlashMode, SessionConfig, Size, StreamTarget,
};

/// Preview resolution bound guaranteed by session-based pipelines.
const MAX_PREVIEW_SIZE: Size = Size {
    width: 1920,
    height: 1080,
};

/// A host-side request, marshaled onto the callback sequence by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open(SessionConfig),
    Close,
    SetFacing(Facing),
    SetAspectRatio(AspectRatio),
    SetAutofocus(bool),
    SetFlash(FlashMode),
    SetDisplayRotation(u16),
    SetMode(CameraMode),
    TakeStillPicture,
    StartRecording(PathBuf),
    StopRecording,
}

/// Live parameter value saved for rollback if the device rejects the update.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LiveParam {
    Autofocus(bool),
    Flash(FlashMode),
}

pub struct CaptureSessionController {
    provider: Box<dyn DeviceProvider>,
    policy: FocusModePolicy,
    config: SessionConfig,
    state: ControllerState,
    device_id: Option<DeviceId>,
    characteristics: Option<DeviceCharacteristics>,
    preview_sizes: SizeCatalog,
    output_sizes: SizeCatalog,
    target: Option<StreamTarget>,
    preview_size: Option<Size>,
    repeating: Option<CaptureRequest>,
    protocol: FocusConvergence,
    /// Last issued session generation; bumped on every configure.
    generation: u64,
    pending_record_start: bool,
    recording: bool,
    video_path: Option<PathBuf>,
    still_sink_ready: bool,
    recorder_ready: bool,
    live_rollback: Option<LiveParam>,
}

impl CaptureSessionController {
    pub fn new(provider: Box<dyn DeviceProvider>) -> Self {
        Self::with_policy(provider, FocusModePolicy::default())
    }

    pub fn with_policy(provider: Box<dyn DeviceProvider>, policy: FocusModePolicy) -> Self {
        Self {
            provider,
            policy,
            config: SessionConfig::default(),
            state: ControllerState::Closed,
            device_id: None,
            characteristics: None,
            preview_sizes: SizeCatalog::new(),
            output_sizes: SizeCatalog::new(),
            target: None,
            preview_size: None,
            repeating: None,
            protocol: FocusConvergence::new(),
            generation: 0,
            pending_record_start: false,
            recording: false,
            video_path: None,
            still_sink_ready: false,
            recorder_ready: false,
            live_rollback: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.device_open()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn focus_stage(&self) -> FocusStage {
        self.protocol.stage()
    }

    pub fn preview_size(&self) -> Option<Size> {
        self.preview_size
    }

    pub fn supported_aspect_ratios(&self) -> Vec<AspectRatio> {
        self.preview_sizes.ratios()
    }

    /// Resolves a device for the configured facing, rebuilds the size
    /// catalogs from its capability report, and requests the asynchronous
    /// device open. Fatal errors leave the controller closed. Effects are
    /// returned alongside the result: a reopen tears the previous device
    /// down first, and those teardown effects must run even when resolving
    /// the new device fails.
    pub fn open(&mut self, config: SessionConfig) -> (Result<(), CaptureError>, Vec<Effect>) {
        let mut effects = if self.state != ControllerState::Closed {
            self.close()
        } else {
            Vec::new()
        };
        self.config = config;
        match self.begin_open() {
            Ok(effect) => {
                effects.push(effect);
                (Ok(()), effects)
            }
            Err(e) => {
                // No half-resolved device bookkeeping survives a failed open.
                self.device_id = None;
                self.characteristics = None;
                (Err(e), effects)
            }
        }
    }

    fn begin_open(&mut self) -> Result<Effect, CaptureError> {
        let (device_id, characteristics) = self.resolve_device()?;
        if characteristics.sensor_orientation.is_none() {
            return Err(CaptureError::MissingSensorOrientation(device_id));
        }
        log::info!(
            "opening device {} (facing {:?}, vendor {})",
            device_id,
            characteristics.facing,
            characteristics.vendor
        );
        self.device_id = Some(device_id.clone());
        self.characteristics = Some(characteristics);
        self.collect_capabilities()?;

        self.state = ControllerState::Opening;
        Ok(Effect::OpenDevice(device_id))
    }

    /// Dispatches one asynchronous signal, returning the effects to run.
    pub fn handle(&mut self, signal: Signal) -> Vec<Effect> {
        match signal {
            Signal::DeviceOpened => {
                if self.state == ControllerState::Opening {
                    log::info!("device opened");
                    self.state = ControllerState::Open;
                    self.build_session()
                } else {
                    log::debug!("ignoring device-opened signal in state {:?}", self.state);
                    Vec::new()
                }
            }
            Signal::DeviceDisconnected => {
                log::warn!("device disconnected");
                self.close()
            }
            Signal::DeviceError(message) => {
                log::error!("device error: {message}");
                self.close()
            }
            Signal::SessionConfigured { generation } => self.on_session_configured(generation),
            Signal::SessionConfigureFailed { generation } => {
                if self.is_stale(generation) {
                    log::debug!("ignoring configure-failed for stale session {generation}");
                    return Vec::new();
                }
                log::error!("failed to configure capture session {generation}");
                self.state = ControllerState::Open;
                Vec::new()
            }
            Signal::SessionClosed { generation } => {
                if self.state.generation() == Some(generation) {
                    self.state = ControllerState::Open;
                }
                Vec::new()
            }
            Signal::TargetAvailable(target) => {
                self.target = Some(target);
                self.build_session()
            }
            Signal::TargetDestroyed => {
                self.target = None;
                self.preview_size = None;
                if let Some(generation) = self.state.generation() {
                    self.state = ControllerState::Open;
                    vec![Effect::CloseSession { generation }]
                } else {
                    Vec::new()
                }
            }
            Signal::Metadata(snapshot) => match self.protocol.observe(&snapshot) {
                Some(action) => self.on_protocol_action(action),
                None => Vec::new(),
            },
            Signal::RepeatingRejected => self.rollback_live_param(),
            Signal::StillCompleted => self.finish_still_capture(),
            Signal::RecorderStopped { ok } => {
                if !ok {
                    log::warn!("recorder stop failed; partial output discarded");
                }
                Vec::new()
            }
        }
    }

    /// Unified command entry used by the driver. The boolean reports whether
    /// the command changed anything. Effects accompany the result rather than
    /// living inside it: a failed command may still have torn resources down,
    /// and the driver must execute those effects before reporting the error.
    pub fn dispatch(&mut self, command: Command) -> (Result<bool, CaptureError>, Vec<Effect>) {
        match command {
            Command::Open(config) => {
                let (result, effects) = self.open(config);
                (result.map(|_| true), effects)
            }
            Command::Close => (Ok(true), self.close()),
            Command::SetFacing(facing) => self.set_facing(facing),
            Command::SetAspectRatio(ratio) => {
                let (changed, effects) = self.set_aspect_ratio(ratio);
                (Ok(changed), effects)
            }
            Command::SetAutofocus(enabled) => {
                let (changed, effects) = self.set_autofocus(enabled);
                (Ok(changed), effects)
            }
            Command::SetFlash(flash) => {
                let (changed, effects) = self.set_flash(flash);
                (Ok(changed), effects)
            }
            Command::SetDisplayRotation(rotation) => {
                let (changed, effects) = self.set_display_rotation(rotation);
                (Ok(changed), effects)
            }
            Command::SetMode(mode) => self.set_mode(mode),
            Command::TakeStillPicture => (Ok(true), self.take_still_picture()),
            Command::StartRecording(path) => self.start_recording(path),
            Command::StopRecording => {
                let (changed, effects) = self.stop_recording();
                (Ok(changed), effects)
            }
        }
    }

    /// Closes session, device, and secondary resources. Safe to call
    /// repeatedly; the second call releases nothing twice.
    pub fn close(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(generation) = self.state.generation() {
            effects.push(Effect::CloseSession { generation });
        }
        if self.state != ControllerState::Closed {
            effects.push(Effect::CloseDevice);
        }
        if self.still_sink_ready {
            effects.push(Effect::ReleaseStillSink);
            self.still_sink_ready = false;
        }
        if self.recorder_ready {
            effects.push(Effect::ReleaseRecorder);
            self.recorder_ready = false;
        }
        self.recording = false;
        self.pending_record_start = false;
        self.live_rollback = None;
        self.repeating = None;
        self.preview_size = None;
        self.device_id = None;
        self.characteristics = None;
        self.protocol.reset();
        self.state = ControllerState::Closed;
        effects
    }

    /// Starts the still-capture sequence: with autofocus on, a focus-lock
    /// trigger and the convergence protocol; otherwise a direct capture.
    pub fn take_still_picture(&mut self) -> Vec<Effect> {
        if !matches!(self.state, ControllerState::SessionActive { .. }) {
            log::warn!("still capture requested without an active session");
            return Vec::new();
        }
        self.protocol.reset();
        if self.config.autofocus {
            self.protocol.begin_lock();
            self.lock_focus()
        } else {
            self.capture_still()
        }
    }

    pub fn set_autofocus(&mut self, enabled: bool) -> (bool, Vec<Effect>) {
        if self.config.autofocus == enabled {
            return (false, Vec::new());
        }
        let previous = self.config.autofocus;
        self.config.autofocus = enabled;
        (true, self.push_live_update(LiveParam::Autofocus(previous)))
    }

    pub fn set_flash(&mut self, flash: FlashMode) -> (bool, Vec<Effect>) {
        if self.config.flash == flash {
            return (false, Vec::new());
        }
        let previous = self.config.flash;
        self.config.flash = flash;
        (true, self.push_live_update(LiveParam::Flash(previous)))
    }

    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) -> (bool, Vec<Effect>) {
        if self.config.aspect_ratio == Some(ratio) {
            return (false, Vec::new());
        }
        if !self.preview_sizes.is_empty() && !self.preview_sizes.contains_ratio(&ratio) {
            log::warn!("aspect ratio {ratio} not supported by the current device");
            return (false, Vec::new());
        }
        self.config.aspect_ratio = Some(ratio);
        (true, self.build_session())
    }

    pub fn set_facing(&mut self, facing: Facing) -> (Result<bool, CaptureError>, Vec<Effect>) {
        if self.config.facing == facing {
            return (Ok(false), Vec::new());
        }
        self.config.facing = facing;
        if self.state == ControllerState::Closed {
            return (Ok(true), Vec::new());
        }
        // Facing changes need a different physical device: full reopen.
        // `open` tears the current device down and keeps those effects even
        // when no replacement device can be resolved.
        let (result, effects) = self.open(self.config.clone());
        (result.map(|_| true), effects)
    }

    pub fn set_mode(&mut self, mode: CameraMode) -> (Result<bool, CaptureError>, Vec<Effect>) {
        if self.config.mode == mode {
            return (Ok(false), Vec::new());
        }
        let previous = self.config.mode;
        self.config.mode = mode;
        if self.characteristics.is_none() {
            // Nothing collected yet; `open` builds the catalogs.
            return (Ok(true), Vec::new());
        }
        let mut effects = Vec::new();
        match mode {
            CameraMode::Video if self.still_sink_ready => {
                effects.push(Effect::ReleaseStillSink);
                self.still_sink_ready = false;
            }
            CameraMode::Photo if self.recorder_ready => {
                effects.push(Effect::ReleaseRecorder);
                self.recorder_ready = false;
                self.recording = false;
                self.pending_record_start = false;
            }
            _ => {}
        }
        // The output catalog is per-mode; rebuild it as soon as the device is
        // known, which covers a mode switch while the open is still pending.
        if let Err(e) = self.collect_capabilities() {
            self.config.mode = previous;
            let _ = self.collect_capabilities();
            return (Err(e), effects);
        }
        effects.extend(self.build_session());
        (Ok(true), effects)
    }

    pub fn set_display_rotation(&mut self, rotation: u16) -> (bool, Vec<Effect>) {
        if self.config.display_rotation == rotation {
            return (false, Vec::new());
        }
        self.config.display_rotation = rotation;
        if let (Some(target), Some(preview)) = (self.target, self.preview_size) {
            (
                true,
                vec![Effect::PublishTransform(self.plan_transform(target, preview))],
            )
        } else {
            (true, Vec::new())
        }
    }

    pub fn start_recording(
        &mut self,
        path: PathBuf,
    ) -> (Result<bool, CaptureError>, Vec<Effect>) {
        if !self.state.device_open() {
            log::warn!("recording requested while the device is closed");
            return (Ok(false), Vec::new());
        }
        if self.recording || self.pending_record_start {
            return (Ok(false), Vec::new());
        }
        let mut effects = Vec::new();
        if self.config.mode != CameraMode::Video {
            self.config.mode = CameraMode::Video;
            if self.still_sink_ready {
                effects.push(Effect::ReleaseStillSink);
                self.still_sink_ready = false;
            }
            if let Err(e) = self.collect_capabilities() {
                self.config.mode = CameraMode::Photo;
                let _ = self.collect_capabilities();
                return (Err(e), effects);
            }
        }
        self.video_path = Some(path);
        self.pending_record_start = true;
        effects.extend(self.build_session());
        (Ok(true), effects)
    }

    pub fn stop_recording(&mut self) -> (bool, Vec<Effect>) {
        self.pending_record_start = false;
        if !self.recording {
            return (false, Vec::new());
        }
        self.recording = false;
        (true, vec![Effect::StopRecorder])
    }

    /// JPEG/recorder orientation for the current mount angle and rotation.
    pub fn effective_rotation(&self) -> u16 {
        let sensor = self
            .characteristics
            .as_ref()
            .and_then(|c| c.sensor_orientation)
            .unwrap_or(0) as i32;
        let sign = if self.config.facing == Facing::Front {
            1
        } else {
            -1
        };
        ((sensor + self.config.display_rotation as i32 * sign + 360) % 360) as u16
    }

    fn resolve_device(&mut self) -> Result<(DeviceId, DeviceCharacteristics), CaptureError> {
        let ids = self.provider.list_devices();
        let first = ids.first().cloned().ok_or(CaptureError::NoDevice)?;
        for id in &ids {
            let characteristics = self.provider.characteristics(id)?;
            if characteristics.facing == self.config.facing {
                return Ok((id.clone(), characteristics));
            }
        }
        // Requested facing unavailable: take the first device and reconcile
        // the config so it reflects what will actually be used.
        let characteristics = self.provider.characteristics(&first)?;
        log::warn!(
            "no {:?}-facing device; falling back to {} ({:?})",
            self.config.facing,
            first,
            characteristics.facing
        );
        self.config.facing = characteristics.facing;
        Ok((first, characteristics))
    }

    /// Rebuilds both catalogs from the capability report. Preview sizes are
    /// capped at the guaranteed bound, preview ratios without an output
    /// counterpart are dropped, and the configured ratio is re-derived from
    /// the largest output size when missing or unsupported.
    fn collect_capabilities(&mut self) -> Result<(), CaptureError> {
        let device_id = self.device_id.clone().unwrap_or_default();
        let characteristics = self
            .characteristics
            .as_ref()
            .ok_or(CaptureError::MissingCapability(device_id.clone()))?;

        self.preview_sizes.clear();
        for size in &characteristics.preview_sizes {
            if MAX_PREVIEW_SIZE.covers(*size) {
                self.preview_sizes.add(*size);
            }
        }

        let use_case = match self.config.mode {
            CameraMode::Photo => UseCase::StillJpeg,
            CameraMode::Video => UseCase::VideoRecord,
        };
        self.output_sizes.clear();
        for size in characteristics.sizes_for(use_case) {
            self.output_sizes.add(*size);
        }

        for ratio in self.preview_sizes.ratios() {
            if !self.output_sizes.contains_ratio(&ratio) {
                self.preview_sizes.remove(&ratio);
            }
        }
        if self.preview_sizes.is_empty() || self.output_sizes.is_empty() {
            return Err(CaptureError::MissingCapability(device_id));
        }

        let ratio_usable = match self.config.aspect_ratio {
            Some(ratio) => !self.preview_sizes.sizes_for(&ratio).is_empty(),
            None => false,
        };
        if !ratio_usable {
            // The output catalog decides the default ratio; some sensors
            // claim preview ratios that render stretched.
            let largest = self.output_sizes.largest()?;
            self.config.aspect_ratio = Some(AspectRatio::of(largest.width, largest.height));
        }
        Ok(())
    }

    /// Builds (or rebuilds) the capture session. No-op until both the device
    /// and a stream target exist. A prior live session is closed first; its
    /// late signals are discarded by generation comparison.
    fn build_session(&mut self) -> Vec<Effect> {
        if !self.state.device_open() {
            return Vec::new();
        }
        let Some(target) = self.target else {
            return Vec::new();
        };
        let Some(ratio) = self.config.aspect_ratio else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        if let Some(old) = self.state.generation() {
            effects.push(Effect::CloseSession { generation: old });
        }

        let preview = match self.preview_sizes.optimal_size(target.size.landscape()) {
            Ok(size) => size,
            Err(e) => {
                log::error!("cannot choose a preview size: {e}");
                return effects;
            }
        };
        self.preview_size = Some(preview);
        effects.push(Effect::SetPreviewBufferSize(preview));
        effects.push(Effect::PublishTransform(self.plan_transform(target, preview)));

        let mut session_targets = vec![TargetKind::Preview];
        let mut request_targets = vec![TargetKind::Preview];
        match self.config.mode {
            CameraMode::Photo => {
                let still = self
                    .output_sizes
                    .sizes_for(&ratio)
                    .iter()
                    .next_back()
                    .copied()
                    .or_else(|| self.output_sizes.largest().ok());
                if let Some(still) = still {
                    effects.push(Effect::PrepareStillSink(still));
                    self.still_sink_ready = true;
                    session_targets.push(TargetKind::StillSink);
                }
            }
            CameraMode::Video => {
                if let Some(path) = self.video_path.clone() {
                    match self
                        .output_sizes
                        .smallest_at_least(&ratio, self.config.min_video_size)
                    {
                        Ok(selection) => {
                            if selection.is_degraded() {
                                log::warn!(
                                    "no {ratio} recording size meets {}; degrading to {}",
                                    self.config.min_video_size,
                                    selection.size()
                                );
                            }
                            effects.push(Effect::PrepareRecorder(RecorderSettings {
                                size: selection.size(),
                                bit_rate: self.config.video_bit_rate,
                                frame_rate: self.config.video_frame_rate,
                                output_path: path,
                                orientation_hint: self.effective_rotation(),
                            }));
                            self.recorder_ready = true;
                            session_targets.push(TargetKind::Recorder);
                            if self.pending_record_start {
                                request_targets.push(TargetKind::Recorder);
                            }
                        }
                        Err(e) => log::error!("cannot choose a recording size: {e}"),
                    }
                }
            }
        }

        self.generation += 1;
        let generation = self.generation;
        self.state = ControllerState::SessionBuilding { generation };
        // Any armed rollback refers to a request on the superseded session;
        // a rejection of the new session's repeating request is transient.
        self.live_rollback = None;
        let template = if self.pending_record_start {
            RequestTemplate::Record
        } else {
            RequestTemplate::Preview
        };
        self.repeating = Some(CaptureRequest::new(template, request_targets));
        effects.push(Effect::ConfigureSession {
            generation,
            targets: session_targets,
        });
        effects
    }

    fn on_session_configured(&mut self, generation: u64) -> Vec<Effect> {
        if self.is_stale(generation)
            || self.state != (ControllerState::SessionBuilding { generation })
        {
            log::debug!("ignoring configured signal for superseded session {generation}");
            return Vec::new();
        }
        log::info!("session {generation} configured");
        self.state = ControllerState::SessionActive { generation };
        self.apply_request_defaults();

        let mut effects = Vec::new();
        if self.pending_record_start {
            // The recorder must be running before its surface receives frames.
            effects.push(Effect::StartRecorder);
            self.pending_record_start = false;
            self.recording = true;
        }
        if let Some(request) = &self.repeating {
            effects.push(Effect::SubmitRepeating(request.clone()));
        }
        effects
    }

    fn is_stale(&self, generation: u64) -> bool {
        generation != self.generation
    }

    /// Writes the configured AF mode and flash fields into the stored
    /// repeating request, clearing any leftover trigger.
    fn apply_request_defaults(&mut self) {
        let af_mode = match (&self.characteristics, self.config.autofocus) {
            (Some(characteristics), true) => self.policy.best_af_mode(characteristics),
            _ => AfMode::Off,
        };
        if let Some(request) = &mut self.repeating {
            request.af_mode = af_mode;
            request.af_trigger = None;
            request.ae_precapture_trigger = None;
            request.apply_flash(self.config.flash);
        }
    }

    /// Live-updatable parameters go straight into the repeating request; the
    /// previous value is kept for rollback if the device rejects the update.
    fn push_live_update(&mut self, previous: LiveParam) -> Vec<Effect> {
        if self.repeating.is_none() {
            return Vec::new();
        }
        self.apply_request_defaults();
        if !matches!(self.state, ControllerState::SessionActive { .. }) {
            return Vec::new();
        }
        self.live_rollback = Some(previous);
        match &self.repeating {
            Some(request) => vec![Effect::SubmitRepeating(request.clone())],
            None => Vec::new(),
        }
    }

    fn rollback_live_param(&mut self) -> Vec<Effect> {
        match self.live_rollback.take() {
            Some(LiveParam::Autofocus(previous)) => {
                log::warn!("autofocus update rejected; reverting to {previous}");
                self.config.autofocus = previous;
                self.apply_request_defaults();
            }
            Some(LiveParam::Flash(previous)) => {
                log::warn!("flash update rejected; reverting to {previous:?}");
                self.config.flash = previous;
                self.apply_request_defaults();
            }
            None => {
                // Transient rejection mid-teardown; the next trigger resubmits.
                log::debug!("repeating request rejected with nothing to roll back");
            }
        }
        Vec::new()
    }

    fn lock_focus(&self) -> Vec<Effect> {
        let Some(request) = &self.repeating else {
            return Vec::new();
        };
        let mut one_shot = request.clone();
        one_shot.af_trigger = Some(Trigger::Start);
        vec![Effect::SubmitOnce(one_shot)]
    }

    fn on_protocol_action(&mut self, action: ConvergenceAction) -> Vec<Effect> {
        match action {
            ConvergenceAction::RetryFocusLock => {
                log::debug!(
                    "focus lock failed, retrying ({} attempts)",
                    self.protocol.lock_attempts()
                );
                self.lock_focus()
            }
            ConvergenceAction::RequirePrecapture => {
                let Some(request) = &self.repeating else {
                    return Vec::new();
                };
                let mut one_shot = request.clone();
                one_shot.ae_precapture_trigger = Some(Trigger::Start);
                // The stored repeating request never carries the trigger, so
                // the next submitted request is trigger-idle and the sequence
                // cannot re-fire.
                self.protocol.note_precapture_started();
                vec![Effect::SubmitOnce(one_shot)]
            }
            ConvergenceAction::Proceed => self.capture_still(),
        }
    }

    /// Submits the final high-resolution capture, pausing the repeating
    /// preview for its duration.
    fn capture_still(&mut self) -> Vec<Effect> {
        let Some(generation) = self.state.generation() else {
            return Vec::new();
        };
        let af_mode = self
            .repeating
            .as_ref()
            .map(|request| request.af_mode)
            .unwrap_or(AfMode::Off);
        let mut request =
            CaptureRequest::new(RequestTemplate::StillCapture, vec![TargetKind::StillSink]);
        request.af_mode = af_mode;
        request.apply_still_flash(self.config.flash);
        request.jpeg_rotation = Some(self.effective_rotation());
        self.state = ControllerState::Capturing { generation };
        vec![Effect::StopRepeating, Effect::SubmitOnce(request)]
    }

    /// After a still capture: cancel the focus trigger, restore defaults,
    /// and resume the repeating preview.
    fn finish_still_capture(&mut self) -> Vec<Effect> {
        // The resume submission below is not a live update; its rejection
        // must not revert a parameter the device already accepted.
        self.live_rollback = None;
        let mut effects = Vec::new();
        if let Some(request) = &self.repeating {
            let mut cancel = request.clone();
            cancel.af_trigger = Some(Trigger::Cancel);
            effects.push(Effect::SubmitOnce(cancel));
        }
        self.apply_request_defaults();
        if let Some(request) = &self.repeating {
            effects.push(Effect::SubmitRepeating(request.clone()));
        }
        self.protocol.reset();
        if let ControllerState::Capturing { generation } = self.state {
            self.state = ControllerState::SessionActive { generation };
        }
        effects
    }

    fn plan_transform(&self, target: StreamTarget, preview: Size) -> Transform {
        transform::plan(
            self.config.display_rotation,
            target.size,
            preview,
            self.effective_rotation(),
        )
    }
}
