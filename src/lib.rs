//! SocialTag landing page core
//!
//! Core modules:
//! - `nav`: Section transition controller and input normalization
//! - `ripple`: Background grid geometry and click ripple
//! - `timer`: One-shot timers with group cancellation
//! - `site`: Shared state every event handler goes through
//! - `settings`: Data-driven tuning, persisted in LocalStorage
//! - `platform`: Browser bindings (wasm32 only)

pub mod error;
pub mod nav;
#[cfg(target_arch = "wasm32")]
pub mod platform;
pub mod ripple;
pub mod settings;
pub mod site;
pub mod timer;

pub use error::{SiteError, SiteResult};
pub use settings::{MotionPreference, Settings};
pub use site::{Dispatch, Site};

/// Site configuration constants
pub mod consts {
    use crate::ripple::Rgb;

    /// Section ids, top to bottom
    pub const SECTIONS: [&str; 5] = ["home", "about", "brands", "creators", "contact"];

    /// Grid cells aim for this size in pixels
    pub const TARGET_CELL_SIZE: f32 = 120.0;

    /// Ripple timing (ms)
    pub const BASE_DELAY_MS: u32 = 50;
    pub const RING_BEAT_MS: u32 = 70;
    pub const FLASH_DURATION_MS: u32 = 200;

    /// Brand accent
    pub const ACCENT_COLOR: &str = "#ff2aa1";
    pub const ACCENT_RGB: Rgb = Rgb::new(0xff, 0x2a, 0xa1);

    /// Input noise thresholds
    pub const WHEEL_THRESHOLD: f64 = 6.0;
    pub const TOUCH_THRESHOLD: f64 = 40.0;

    /// Each half of a section transition (ms)
    pub const PHASE_DURATION_MS: u32 = 500;
}
