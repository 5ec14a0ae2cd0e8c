//! Section navigation
//!
//! Pure and platform-free:
//! - `section`: the ordered deck and each section's phase motions
//! - `controller`: the two-phase transition state machine
//! - `input`: wheel/key/touch normalization
//! - `scrollspy`: active section from scroll position

pub mod controller;
pub mod input;
pub mod scrollspy;
pub mod section;

pub use controller::{
    IgnoreReason, PhaseOutcome, PhaseRunner, PhaseTicket, RequestOutcome, TransitionController,
    TransitionState,
};
pub use input::{InputGate, InputNormalizer, InputVerdict, NavCommand, NavInput, key_command};
pub use scrollspy::active_section;
pub use section::{Direction, Ease, MotionFrame, Phase, PhaseMotion, PhaseSet, Section, SectionDeck};
