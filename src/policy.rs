//! Autofocus mode selection policy.
//!
//! Which AF mode to prefer, and which device quirks exclude a mode, is
//! injected data rather than hard-coded branches: vendor exceptions are
//! rows in a table the host can replace.

use serde::{Deserialize, Serialize};

use crate::hal::{AfMode, DeviceCharacteristics, HardwareTier};

/// Excludes one AF mode on a hardware tier, optionally limited to a vendor
/// (matched case-insensitively). `vendor: None` excludes the mode on the
/// tier for every vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeExclusion {
    pub mode: AfMode,
    pub tier: HardwareTier,
    pub vendor: Option<String>,
}

impl ModeExclusion {
    fn applies_to(&self, characteristics: &DeviceCharacteristics) -> bool {
        self.tier == characteristics.tier
            && match &self.vendor {
                None => true,
                Some(vendor) => characteristics.vendor.eq_ignore_ascii_case(vendor),
            }
    }
}

/// Preference-ordered AF mode table with exclusion rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusModePolicy {
    /// Modes to try, most preferred first.
    pub preference: Vec<AfMode>,
    pub exclusions: Vec<ModeExclusion>,
}

impl Default for FocusModePolicy {
    fn default() -> Self {
        Self {
            preference: vec![AfMode::ContinuousPicture, AfMode::Auto],
            // Continuous-picture AF stalls on some legacy-tier Samsung
            // devices (e.g. the S5); fall through to plain auto there.
            exclusions: vec![ModeExclusion {
                mode: AfMode::ContinuousPicture,
                tier: HardwareTier::Legacy,
                vendor: Some("samsung".to_string()),
            }],
        }
    }
}

impl FocusModePolicy {
    /// The most preferred supported, non-excluded mode; `Off` when nothing
    /// qualifies.
    pub fn best_af_mode(&self, characteristics: &DeviceCharacteristics) -> AfMode {
        for mode in &self.preference {
            if self
                .exclusions
                .iter()
                .any(|exclusion| exclusion.mode == *mode && exclusion.applies_to(characteristics))
            {
                continue;
            }
            if characteristics.af_modes.contains(mode) {
                return *mode;
            }
        }
        AfMode::Off
    }
}
