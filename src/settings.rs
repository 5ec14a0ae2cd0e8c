//! Site settings and preferences
//!
//! Persisted in LocalStorage. Every field has a default taken from the
//! production page, so a partial JSON document is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{SiteError, SiteResult};
use crate::nav::Ease;
use crate::ripple::{Rgb, WaveMode};

/// Smallest grid cell accepted (px)
const MIN_CELL_SIZE: f32 = 16.0;
/// Upper bound for every ripple timing (ms)
const MAX_RIPPLE_DELAY_MS: u32 = 10_000;

/// User override for the reduced-motion accessibility preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MotionPreference {
    /// Follow `prefers-reduced-motion`
    #[default]
    Auto,
    /// Always reduce
    Reduce,
    /// Always animate
    Full,
}

impl MotionPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionPreference::Auto => "auto",
            MotionPreference::Reduce => "reduce",
            MotionPreference::Full => "full",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" | "system" => Some(MotionPreference::Auto),
            "reduce" | "reduced" => Some(MotionPreference::Reduce),
            "full" | "none" => Some(MotionPreference::Full),
            _ => None,
        }
    }
}

/// Click ripple tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleSettings {
    /// Accent colour as `#rrggbb`
    pub accent: String,
    /// Target grid cell size in pixels
    pub cell_size: f32,
    /// Delay before the first ring after the origin (ms)
    pub base_delay_ms: u32,
    /// Delay between consecutive rings (ms)
    pub ring_beat_ms: u32,
    /// How long a cell stays lit (ms)
    pub flash_ms: u32,
    /// Alpha at the origin
    pub max_alpha: f32,
    /// Alpha floor so outer cells never vanish
    pub min_alpha: f32,
    /// Alpha lost per whole ring
    pub ring_falloff: f32,
    /// Alpha lost per fractional ring
    pub fractional_falloff: f32,
    /// Ring distance metric
    pub mode: WaveMode,
}

impl Default for RippleSettings {
    fn default() -> Self {
        Self {
            accent: ACCENT_COLOR.to_string(),
            cell_size: TARGET_CELL_SIZE,
            base_delay_ms: BASE_DELAY_MS,
            ring_beat_ms: RING_BEAT_MS,
            flash_ms: FLASH_DURATION_MS,
            max_alpha: 0.45,
            min_alpha: 0.08,
            ring_falloff: 0.05,
            fractional_falloff: 0.1,
            mode: WaveMode::IndexRings,
        }
    }
}

/// Input noise thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Minimum |deltaY| for a wheel event to navigate
    pub wheel_threshold: f64,
    /// Minimum vertical swipe distance (px)
    pub touch_threshold: f64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            wheel_threshold: WHEEL_THRESHOLD,
            touch_threshold: TOUCH_THRESHOLD,
        }
    }
}

/// Section enter/exit motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSettings {
    /// Duration of each phase (ms)
    pub phase_ms: u32,
    /// Opacity the outgoing section fades to
    pub out_opacity: f32,
    /// Distance the outgoing section drifts (px)
    pub out_offset: f32,
    /// Distance the incoming section travels in from (px)
    pub in_offset: f32,
    pub ease: Ease,
    /// Report a phase as finished if the animation never does (ms).
    /// Off by default: completion is assumed to always fire.
    pub phase_timeout_ms: Option<u32>,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            phase_ms: PHASE_DURATION_MS,
            out_opacity: 0.6,
            out_offset: 30.0,
            in_offset: 50.0,
            ease: Ease::OutCubic,
            phase_timeout_ms: None,
        }
    }
}

/// Site settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Reduced-motion override
    pub motion: MotionPreference,
    pub ripple: RippleSettings,
    pub input: InputSettings,
    pub transition: TransitionSettings,
}

impl Settings {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> SiteResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> SiteResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject values that would make the site misbehave
    pub fn validate(&self) -> SiteResult<()> {
        fn bad(field: &'static str, reason: impl Into<String>) -> SiteError {
            SiteError::InvalidSetting {
                field,
                reason: reason.into(),
            }
        }

        Rgb::from_hex(&self.ripple.accent)?;

        let ripple = &self.ripple;
        if !(ripple.cell_size.is_finite() && ripple.cell_size >= MIN_CELL_SIZE) {
            return Err(bad("ripple.cell_size", format!("must be at least {}", MIN_CELL_SIZE)));
        }
        if !(1..=MAX_RIPPLE_DELAY_MS).contains(&ripple.ring_beat_ms) {
            return Err(bad(
                "ripple.ring_beat_ms",
                format!("must be within 1..={}", MAX_RIPPLE_DELAY_MS),
            ));
        }
        if ripple.base_delay_ms > MAX_RIPPLE_DELAY_MS {
            return Err(bad(
                "ripple.base_delay_ms",
                format!("must be at most {}", MAX_RIPPLE_DELAY_MS),
            ));
        }
        if ripple.flash_ms > MAX_RIPPLE_DELAY_MS {
            return Err(bad(
                "ripple.flash_ms",
                format!("must be at most {}", MAX_RIPPLE_DELAY_MS),
            ));
        }
        if !(0.0..=1.0).contains(&ripple.min_alpha) || !(0.0..=1.0).contains(&ripple.max_alpha) {
            return Err(bad("ripple.min_alpha", "alphas must be within 0..=1"));
        }
        if ripple.min_alpha > ripple.max_alpha {
            return Err(bad("ripple.min_alpha", "floor is above max_alpha"));
        }
        if ripple.ring_falloff < 0.0 || ripple.fractional_falloff < 0.0 {
            return Err(bad("ripple.ring_falloff", "falloff cannot be negative"));
        }

        let input = &self.input;
        if !(input.wheel_threshold.is_finite() && input.wheel_threshold >= 0.0) {
            return Err(bad("input.wheel_threshold", "must be >= 0"));
        }
        if !(input.touch_threshold.is_finite() && input.touch_threshold >= 0.0) {
            return Err(bad("input.touch_threshold", "must be >= 0"));
        }

        let transition = &self.transition;
        if !(0.0..=1.0).contains(&transition.out_opacity) {
            return Err(bad("transition.out_opacity", "must be within 0..=1"));
        }
        if transition.phase_timeout_ms == Some(0) {
            return Err(bad("transition.phase_timeout_ms", "use null to disable"));
        }
        Ok(())
    }

    /// Parsed accent colour, falling back to the brand colour
    pub fn accent(&self) -> Rgb {
        Rgb::from_hex(&self.ripple.accent).unwrap_or(ACCENT_RGB)
    }

    /// Effective reduced motion given the system preference
    pub fn effective_reduced_motion(&self, system_prefers_reduced: bool) -> bool {
        match self.motion {
            MotionPreference::Auto => system_prefers_reduced,
            MotionPreference::Reduce => true,
            MotionPreference::Full => false,
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "socialtag_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Settings saved");
                }
                Err(e) => log::warn!("Could not serialise settings: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
