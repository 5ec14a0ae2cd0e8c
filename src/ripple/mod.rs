//! Background grid and click ripple
//!
//! Geometry and planning are pure; `effect` drives a plan through a
//! [`crate::timer::Scheduler`].

pub mod color;
pub mod effect;
pub mod grid;
pub mod wave;

pub use color::{Rgb, Rgba};
pub use effect::{FlashBoard, RippleEffect};
pub use grid::{CellKey, GridSpec};
pub use wave::{RippleBurst, RippleCell, RipplePlan, WaveMode, plan_ripple, ring_alpha, ring_delay_ms};
