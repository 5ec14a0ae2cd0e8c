//! Input normalization
//!
//! Wheel, keyboard and touch events all collapse into a single
//! [`NavCommand`]. Small wheel deltas and short swipes are treated as noise.

use super::section::Direction;
use crate::settings::InputSettings;

/// A raw navigation-relevant event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavInput<'a> {
    Wheel { delta_y: f64 },
    /// `KeyboardEvent.key`
    Key(&'a str),
    TouchStart { y: f64, touches: u32 },
    TouchMove { y: f64 },
    TouchEnd,
    TouchCancel,
}

/// A discrete navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Step(Direction),
    First,
    Last,
}

impl NavCommand {
    /// Target index given the current index and deck length.
    ///
    /// `Step(Down)` past the end is returned as-is for the controller to
    /// reject; `Step(Up)` from 0 has no target.
    pub fn resolve(self, current: usize, len: usize) -> Option<usize> {
        match self {
            NavCommand::Step(Direction::Down) => Some(current + 1),
            NavCommand::Step(Direction::Up) => current.checked_sub(1),
            NavCommand::First => Some(0),
            NavCommand::Last => len.checked_sub(1),
        }
    }
}

/// Map `KeyboardEvent.key` onto the navigation allow-list
pub fn key_command(key: &str) -> Option<NavCommand> {
    match key {
        "ArrowDown" | "PageDown" | " " | "Spacebar" => Some(NavCommand::Step(Direction::Down)),
        "ArrowUp" | "PageUp" => Some(NavCommand::Step(Direction::Up)),
        "Home" => Some(NavCommand::First),
        "End" => Some(NavCommand::Last),
        _ => None,
    }
}

/// Conditions under which navigation is suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputGate {
    pub loading: bool,
    pub menu_open: bool,
    pub transitioning: bool,
}

impl InputGate {
    #[inline]
    pub fn is_open(&self) -> bool {
        !(self.loading || self.menu_open || self.transitioning)
    }
}

/// What to do with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputVerdict {
    /// Call `preventDefault()` on the event
    pub suppress_default: bool,
    pub command: Option<NavCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TouchTrack {
    start_y: f64,
    last_y: f64,
}

/// Stateful translator (touch gestures span several events)
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    wheel_threshold: f64,
    touch_threshold: f64,
    touch: Option<TouchTrack>,
}

impl Default for InputNormalizer {
    fn default() -> Self {
        Self::new(&InputSettings::default())
    }
}

impl InputNormalizer {
    pub fn new(settings: &InputSettings) -> Self {
        Self {
            wheel_threshold: settings.wheel_threshold,
            touch_threshold: settings.touch_threshold,
            touch: None,
        }
    }

    pub fn is_tracking_touch(&self) -> bool {
        self.touch.is_some()
    }

    /// Translate one event. Gesture tracking continues while the gate is
    /// closed; only the resulting command is dropped.
    pub fn normalize(&mut self, input: NavInput<'_>, gate: InputGate) -> InputVerdict {
        let (suppress_default, command) = match input {
            NavInput::Wheel { delta_y } => {
                let command = if delta_y.abs() < self.wheel_threshold {
                    None
                } else {
                    Direction::from_delta(delta_y).map(NavCommand::Step)
                };
                (true, command)
            }
            NavInput::Key(key) => {
                let command = key_command(key);
                (command.is_some(), command)
            }
            NavInput::TouchStart { y, touches } => {
                self.touch = (touches == 1).then_some(TouchTrack {
                    start_y: y,
                    last_y: y,
                });
                (false, None)
            }
            NavInput::TouchMove { y } => {
                if let Some(track) = self.touch.as_mut() {
                    track.last_y = y;
                }
                (true, None)
            }
            NavInput::TouchEnd => {
                let command = self.touch.take().and_then(|track| {
                    // Finger moving up (start below end) scrolls down
                    let delta = track.start_y - track.last_y;
                    if delta.abs() < self.touch_threshold {
                        None
                    } else {
                        Direction::from_delta(delta).map(NavCommand::Step)
                    }
                });
                (false, command)
            }
            NavInput::TouchCancel => {
                self.touch = None;
                (false, None)
            }
        };

        InputVerdict {
            suppress_default,
            command: command.filter(|_| gate.is_open()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: InputGate = InputGate {
        loading: false,
        menu_open: false,
        transitioning: false,
    };

    fn swipe(n: &mut InputNormalizer, from: f64, to: f64, gate: InputGate) -> InputVerdict {
        n.normalize(NavInput::TouchStart { y: from, touches: 1 }, gate);
        n.normalize(NavInput::TouchMove { y: (from + to) / 2.0 }, gate);
        n.normalize(NavInput::TouchMove { y: to }, gate);
        n.normalize(NavInput::TouchEnd, gate)
    }

    #[test]
    fn test_wheel_threshold() {
        let mut n = InputNormalizer::default();
        let small = n.normalize(NavInput::Wheel { delta_y: 3.0 }, OPEN);
        assert_eq!(small.command, None);
        assert!(small.suppress_default);

        let down = n.normalize(NavInput::Wheel { delta_y: 10.0 }, OPEN);
        assert_eq!(down.command, Some(NavCommand::Step(Direction::Down)));

        let up = n.normalize(NavInput::Wheel { delta_y: -6.0 }, OPEN);
        assert_eq!(up.command, Some(NavCommand::Step(Direction::Up)));
    }

    #[test]
    fn test_key_allow_list() {
        let mut n = InputNormalizer::default();
        let end = n.normalize(NavInput::Key("End"), OPEN);
        assert_eq!(end.command, Some(NavCommand::Last));
        assert!(end.suppress_default);

        assert_eq!(
            n.normalize(NavInput::Key("Home"), OPEN).command,
            Some(NavCommand::First)
        );
        assert_eq!(
            n.normalize(NavInput::Key("PageUp"), OPEN).command,
            Some(NavCommand::Step(Direction::Up))
        );
        assert_eq!(
            n.normalize(NavInput::Key(" "), OPEN).command,
            Some(NavCommand::Step(Direction::Down))
        );

        let other = n.normalize(NavInput::Key("a"), OPEN);
        assert_eq!(other, InputVerdict::default());
    }

    #[test]
    fn test_touch_threshold() {
        let mut n = InputNormalizer::default();
        assert_eq!(swipe(&mut n, 400.0, 375.0, OPEN).command, None);

        // Finger travels 50px up the screen: next section
        assert_eq!(
            swipe(&mut n, 400.0, 350.0, OPEN).command,
            Some(NavCommand::Step(Direction::Down))
        );
        assert_eq!(
            swipe(&mut n, 300.0, 400.0, OPEN).command,
            Some(NavCommand::Step(Direction::Up))
        );
        assert!(!n.is_tracking_touch());
    }

    #[test]
    fn test_touch_edge_cases() {
        let mut n = InputNormalizer::default();
        // End without start
        assert_eq!(n.normalize(NavInput::TouchEnd, OPEN).command, None);

        // Two-finger gesture is not a swipe
        n.normalize(NavInput::TouchStart { y: 400.0, touches: 2 }, OPEN);
        n.normalize(NavInput::TouchMove { y: 100.0 }, OPEN);
        assert_eq!(n.normalize(NavInput::TouchEnd, OPEN).command, None);

        // Cancelled gesture
        n.normalize(NavInput::TouchStart { y: 400.0, touches: 1 }, OPEN);
        n.normalize(NavInput::TouchMove { y: 100.0 }, OPEN);
        n.normalize(NavInput::TouchCancel, OPEN);
        assert_eq!(n.normalize(NavInput::TouchEnd, OPEN).command, None);

        // A tap never moves
        n.normalize(NavInput::TouchStart { y: 400.0, touches: 1 }, OPEN);
        assert_eq!(n.normalize(NavInput::TouchEnd, OPEN).command, None);
    }

    #[test]
    fn test_closed_gate_still_suppresses() {
        let mut n = InputNormalizer::default();
        for gate in [
            InputGate { loading: true, ..OPEN },
            InputGate { menu_open: true, ..OPEN },
            InputGate { transitioning: true, ..OPEN },
        ] {
            let wheel = n.normalize(NavInput::Wheel { delta_y: 50.0 }, gate);
            assert!(wheel.suppress_default);
            assert_eq!(wheel.command, None);

            let key = n.normalize(NavInput::Key("ArrowDown"), gate);
            assert!(key.suppress_default);
            assert_eq!(key.command, None);

            assert_eq!(swipe(&mut n, 500.0, 100.0, gate).command, None);
        }
    }

    #[test]
    fn test_resolve() {
        let down = NavCommand::Step(Direction::Down);
        let up = NavCommand::Step(Direction::Up);
        assert_eq!(down.resolve(2, 5), Some(3));
        assert_eq!(down.resolve(4, 5), Some(5));
        assert_eq!(up.resolve(0, 5), None);
        assert_eq!(up.resolve(3, 5), Some(2));
        assert_eq!(NavCommand::First.resolve(3, 5), Some(0));
        assert_eq!(NavCommand::Last.resolve(1, 5), Some(4));
    }
}
