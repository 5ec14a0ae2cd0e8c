//! Sections and their precomputed enter/exit motions

use serde::{Deserialize, Serialize};

use crate::error::{SiteError, SiteResult};
use crate::settings::TransitionSettings;

/// Navigation direction through the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards higher indices
    Down,
    /// Towards lower indices
    Up,
}

impl Direction {
    /// Direction of travel from `from` to `to` (equal indices count as up)
    pub fn between(from: usize, to: usize) -> Self {
        if to > from {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    /// Sign of a scroll-like delta; zero has no direction
    pub fn from_delta(delta: f64) -> Option<Self> {
        if delta > 0.0 {
            Some(Direction::Down)
        } else if delta < 0.0 {
            Some(Direction::Up)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
        }
    }
}

/// Half of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Current section leaves
    Out,
    /// Target section arrives
    In,
}

/// Easing presets, mapped onto CSS timing functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    OutQuad,
    InOutQuad,
    #[default]
    OutCubic,
    InOutCubic,
}

impl Ease {
    pub fn css(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::OutQuad => "cubic-bezier(0.5, 1, 0.89, 1)",
            Self::InOutQuad => "cubic-bezier(0.45, 0, 0.55, 1)",
            Self::OutCubic => "cubic-bezier(0.33, 1, 0.68, 1)",
            Self::InOutCubic => "cubic-bezier(0.65, 0, 0.35, 1)",
        }
    }
}

/// Visual state at one end of a motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionFrame {
    pub opacity: f32,
    /// Vertical offset in pixels (positive is down)
    pub offset_y: f32,
}

impl MotionFrame {
    pub const REST: Self = Self {
        opacity: 1.0,
        offset_y: 0.0,
    };
}

/// One animation a section plays during a phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseMotion {
    pub from: MotionFrame,
    pub to: MotionFrame,
    pub duration_ms: u32,
    pub ease: Ease,
}

/// The four motions a section can play
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSet {
    pub in_down: PhaseMotion,
    pub in_up: PhaseMotion,
    pub out_down: PhaseMotion,
    pub out_up: PhaseMotion,
}

impl PhaseSet {
    /// Build the motions from transition settings.
    ///
    /// Moving down, the old section drifts up and the new one rises from
    /// below; moving up mirrors both offsets.
    pub fn from_settings(t: &TransitionSettings) -> Self {
        let out = |offset_y: f32| PhaseMotion {
            from: MotionFrame::REST,
            to: MotionFrame {
                opacity: t.out_opacity,
                offset_y,
            },
            duration_ms: t.phase_ms,
            ease: t.ease,
        };
        let enter = |offset_y: f32| PhaseMotion {
            from: MotionFrame {
                opacity: 0.0,
                offset_y,
            },
            to: MotionFrame::REST,
            duration_ms: t.phase_ms,
            ease: t.ease,
        };

        Self {
            in_down: enter(t.in_offset),
            in_up: enter(-t.in_offset),
            out_down: out(-t.out_offset),
            out_up: out(t.out_offset),
        }
    }

    pub fn motion(&self, phase: Phase, direction: Direction) -> &PhaseMotion {
        match (phase, direction) {
            (Phase::In, Direction::Down) => &self.in_down,
            (Phase::In, Direction::Up) => &self.in_up,
            (Phase::Out, Direction::Down) => &self.out_down,
            (Phase::Out, Direction::Up) => &self.out_up,
        }
    }
}

/// One full-viewport panel
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub phases: PhaseSet,
}

/// Ordered, fixed, non-empty list of sections
#[derive(Debug, Clone, PartialEq)]
pub struct SectionDeck {
    sections: Vec<Section>,
}

impl SectionDeck {
    pub fn new<I, S>(ids: I, transition: &TransitionSettings) -> SiteResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phases = PhaseSet::from_settings(transition);
        let mut sections: Vec<Section> = Vec::new();
        for id in ids {
            let id = id.into();
            if sections.iter().any(|s| s.id == id) {
                return Err(SiteError::DuplicateSection(id));
            }
            sections.push(Section {
                id,
                phases: phases.clone(),
            });
        }

        if sections.is_empty() {
            return Err(SiteError::NoSections);
        }
        Ok(Self { sections })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn id(&self, index: usize) -> Option<&str> {
        self.get(index).map(|s| s.id.as_str())
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    #[inline]
    pub fn last_index(&self) -> usize {
        self.sections.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }
}
