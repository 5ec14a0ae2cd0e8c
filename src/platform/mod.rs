//! Browser platform layer
//!
//! Handles the browser side of:
//! - Timers (`setTimeout`)
//! - Phase animations (Web Animations API)
//! - `prefers-reduced-motion`
//! - DOM lookups and event listeners

pub mod animate;
pub mod dom;
pub mod motion;
pub mod timers;

pub use animate::{PhaseNotify, WaapiRunner};
pub use motion::ReducedMotionQuery;
pub use timers::BrowserScheduler;
