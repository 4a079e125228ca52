//! camsession: capture-session orchestration for asynchronous camera pipelines
//!
//! This crate sits between an application and a session-based camera driver
//! that reports state only through asynchronous callbacks. It negotiates
//! stream resolutions, drives the repeating preview, runs focus/exposure
//! convergence before a still capture, and manages session teardown/rebuild
//! on every parameter change.
//!
//! # Features
//! - Aspect-ratio-bucketed size negotiation for preview, still, and
//!   recording streams
//! - Focus/exposure convergence protocol with bounded lock retries
//! - Generation-checked session lifecycle robust to stale async callbacks
//! - Live parameter updates (autofocus, flash) with rollback on rejection
//! - Display transform planning for rotated surfaces
//!
//! # Usage
//! The host supplies the two hardware-facing collaborators and runs the
//! driver loop on a task:
//! ```rust,ignore
//! use camsession::{SessionConfig, SessionDirector};
//!
//! let (director, handle) = SessionDirector::new(provider, hal);
//! tokio::spawn(director.run());
//! handle.open(SessionConfig::default()).await?;
//! ```
//! Hardware callbacks are forwarded with `handle.signal(...)`; everything is
//! processed on the driver's single sequence.

pub mod convergence;
pub mod errors;
pub mod hal;
pub mod policy;
pub mod session;
pub mod sizes;
pub mod transform;
pub mod types;

// Re-exports for convenience
pub use convergence::{ConvergenceAction, FocusConvergence, FocusStage, MAX_LOCK_ATTEMPTS};
pub use errors::CaptureError;
pub use policy::{FocusModePolicy, ModeExclusion};
pub use session::{
    CaptureSessionController, Command, ControllerState, Effect, SessionDirector, SessionHandle,
    Signal,
};
pub use sizes::{SizeCatalog, SizeSelection};
pub use transform::Transform;
pub use types::{
    AspectRatio, CameraMode, Facing, FlashMode, SessionConfig, Size, StreamTarget,
};

/// Initialize logging for the capture core
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "camsession=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_metadata() {
        assert_eq!(NAME, "camsession");
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_config_is_photo_mode() {
        let config = SessionConfig::default();
        assert_eq!(config.mode, CameraMode::Photo);
        assert!(config.autofocus);
    }
}
