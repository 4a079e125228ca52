//! Single-sequence driver for the controller.
//!
//! Hardware callbacks and host commands are funneled through one channel and
//! processed by one task, so controller state is only ever touched on that
//! sequence. The director executes the controller's effects against the HAL
//! and classifies submission failures: a rejected repeating request rolls the
//! offending parameter back, everything else is transient and dropped.

use std::collections::VecDeque;
use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use super::effects::{Effect, Signal};
use super::{CaptureSessionController, Command};
use crate::errors::CaptureError;
use crate::hal::{CaptureHal, DeviceProvider, RecorderSettings};
use crate::types::{AspectRatio, CameraMode, Facing, FlashMode, SessionConfig};

enum Inbound {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<bool, CaptureError>>,
    },
    Signal(Signal),
}

/// Cloneable host-side handle. Commands are marshaled onto the driver task
/// and answered once processed; signals are fire-and-forget.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Inbound>,
}

pub struct SessionDirector {
    controller: CaptureSessionController,
    hal: Box<dyn CaptureHal>,
    rx: mpsc::UnboundedReceiver<Inbound>,
    /// Settings of the last prepared recorder, kept for partial-file cleanup.
    recorder_settings: Option<RecorderSettings>,
}

impl SessionDirector {
    pub fn new(
        provider: Box<dyn DeviceProvider>,
        hal: Box<dyn CaptureHal>,
    ) -> (Self, SessionHandle) {
        Self::with_controller(CaptureSessionController::new(provider), hal)
    }

    pub fn with_controller(
        controller: CaptureSessionController,
        hal: Box<dyn CaptureHal>,
    ) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                controller,
                hal,
                rx,
                recorder_settings: None,
            },
            SessionHandle { tx },
        )
    }

    /// Runs until every [`SessionHandle`] is dropped.
    pub async fn run(mut self) {
        while let Some(inbound) = self.rx.recv().await {
            match inbound {
                Inbound::Command { command, reply } => {
                    // A failed command may still have torn resources down
                    // (e.g. a reopen that found no device); its effects run
                    // before the error is reported.
                    let (result, effects) = self.controller.dispatch(command);
                    self.execute(effects);
                    let _ = reply.send(result);
                }
                Inbound::Signal(signal) => {
                    let effects = self.controller.handle(signal);
                    self.execute(effects);
                }
            }
        }
        log::debug!("all session handles dropped; driver loop exiting");
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            for follow_up in self.perform(effect) {
                queue.push_back(follow_up);
            }
        }
    }

    /// Performs one effect; failures fed back into the controller may yield
    /// follow-up effects.
    fn perform(&mut self, effect: Effect) -> Vec<Effect> {
        match effect {
            Effect::OpenDevice(id) => {
                if let Err(e) = self.hal.open_device(&id) {
                    log::error!("device open submission failed: {e}");
                    return self.controller.handle(Signal::DeviceError(e.to_string()));
                }
            }
            Effect::CloseDevice => self.hal.close_device(),
            Effect::ConfigureSession {
                generation,
                targets,
            } => {
                if let Err(e) = self.hal.configure_session(generation, &targets) {
                    log::warn!("session configure submission failed: {e}");
                    return self
                        .controller
                        .handle(Signal::SessionConfigureFailed { generation });
                }
            }
            Effect::CloseSession { generation } => self.hal.close_session(generation),
            Effect::SubmitRepeating(request) => {
                if let Err(e) = self.hal.submit_repeating(&request) {
                    log::warn!("repeating request rejected: {e}");
                    return self.controller.handle(Signal::RepeatingRejected);
                }
            }
            Effect::SubmitOnce(request) => {
                // Transient: the next triggering event resubmits naturally.
                if let Err(e) = self.hal.submit_once(&request) {
                    log::warn!("one-shot request dropped: {e}");
                }
            }
            Effect::StopRepeating => self.hal.stop_repeating(),
            Effect::SetPreviewBufferSize(size) => self.hal.set_preview_buffer_size(size),
            Effect::PublishTransform(transform) => self.hal.publish_transform(transform),
            Effect::PrepareStillSink(size) => {
                if let Err(e) = self.hal.prepare_still_sink(size) {
                    log::error!("still sink prepare failed: {e}");
                }
            }
            Effect::ReleaseStillSink => self.hal.release_still_sink(),
            Effect::PrepareRecorder(settings) => match self.hal.prepare_recorder(&settings) {
                Ok(()) => self.recorder_settings = Some(settings),
                Err(e) => log::error!("recorder prepare failed: {e}"),
            },
            Effect::StartRecorder => {
                if let Err(e) = self.hal.start_recorder() {
                    log::error!("recorder start failed: {e}");
                }
            }
            Effect::StopRecorder => return self.stop_recorder(),
            Effect::ReleaseRecorder => {
                self.hal.release_recorder();
                self.recorder_settings = None;
            }
        }
        Vec::new()
    }

    /// Best-effort recorder stop: on failure the partial output file is
    /// removed, and the recorder is always reset so it never ends up stuck.
    fn stop_recorder(&mut self) -> Vec<Effect> {
        let result = self.hal.stop_recorder();
        if let Err(e) = &result {
            log::error!("failed to stop recording: {e}");
            if let Some(settings) = &self.recorder_settings {
                if let Err(io) = std::fs::remove_file(&settings.output_path) {
                    log::debug!("could not remove partial recording: {io}");
                }
            }
        }
        self.hal.reset_recorder();
        self.controller.handle(Signal::RecorderStopped {
            ok: result.is_ok(),
        })
    }
}

impl SessionHandle {
    async fn command(&self, command: Command) -> Result<bool, CaptureError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Inbound::Command { command, reply })
            .map_err(|_| CaptureError::Closed)?;
        response.await.map_err(|_| CaptureError::Closed)?
    }

    /// Delivers a hardware signal onto the driver sequence. Returns `false`
    /// once the driver has shut down.
    pub fn signal(&self, signal: Signal) -> bool {
        self.tx.send(Inbound::Signal(signal)).is_ok()
    }

    pub async fn open(&self, config: SessionConfig) -> Result<(), CaptureError> {
        self.command(Command::Open(config)).await.map(|_| ())
    }

    pub async fn close(&self) -> Result<(), CaptureError> {
        self.command(Command::Close).await.map(|_| ())
    }

    pub async fn set_facing(&self, facing: Facing) -> Result<bool, CaptureError> {
        self.command(Command::SetFacing(facing)).await
    }

    pub async fn set_aspect_ratio(&self, ratio: AspectRatio) -> Result<bool, CaptureError> {
        self.command(Command::SetAspectRatio(ratio)).await
    }

    pub async fn set_autofocus(&self, enabled: bool) -> Result<bool, CaptureError> {
        self.command(Command::SetAutofocus(enabled)).await
    }

    pub async fn set_flash(&self, flash: FlashMode) -> Result<bool, CaptureError> {
        self.command(Command::SetFlash(flash)).await
    }

    pub async fn set_display_rotation(&self, rotation: u16) -> Result<bool, CaptureError> {
        self.command(Command::SetDisplayRotation(rotation)).await
    }

    pub async fn set_mode(&self, mode: CameraMode) -> Result<bool, CaptureError> {
        self.command(Command::SetMode(mode)).await
    }

    pub async fn take_still_picture(&self) -> Result<(), CaptureError> {
        self.command(Command::TakeStillPicture).await.map(|_| ())
    }

    pub async fn start_recording(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<bool, CaptureError> {
        self.command(Command::StartRecording(path.into())).await
    }

    pub async fn stop_recording(&self) -> Result<bool, CaptureError> {
        self.command(Command::StopRecording).await
    }
}
