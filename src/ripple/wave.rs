//! Click ripple planning
//!
//! Turns a click position into a list of bursts: groups of cells that light
//! up together after a delay, each with its own alpha-tinted colour. Pure
//! geometry, no timers; see [`super::RippleEffect`] for scheduling.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::color::{Rgb, Rgba};
use super::grid::{CellKey, GridSpec};
use crate::settings::RippleSettings;

/// How distance from the click is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaveMode {
    /// Distance between cell indices, floored into whole rings
    #[default]
    IndexRings,
    /// Pixel distance to each cell centre, continuous delay
    PixelWavefront,
}

/// One lit cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleCell {
    pub key: CellKey,
    pub color: Rgba,
}

/// Cells that fire together
#[derive(Debug, Clone, PartialEq)]
pub struct RippleBurst {
    pub delay_ms: u32,
    pub cells: Vec<RippleCell>,
}

/// Full ripple schedule for one click, bursts ordered by delay
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RipplePlan {
    pub origin: Option<CellKey>,
    pub bursts: Vec<RippleBurst>,
}

impl RipplePlan {
    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.bursts.iter().map(|b| b.cells.len()).sum()
    }
}

/// Alpha for a cell `distance` rings away from the origin
pub fn ring_alpha(distance: f32, params: &RippleSettings) -> f32 {
    let ring = distance.floor();
    let fractional = distance - ring;
    (params.max_alpha - ring * params.ring_falloff - fractional * params.fractional_falloff)
        .max(params.min_alpha)
}

/// Delay of an index ring: origin fires at once, ring 1 after the base delay
pub fn ring_delay_ms(ring: u32, params: &RippleSettings) -> u32 {
    if ring == 0 {
        0
    } else {
        params
            .base_delay_ms
            .saturating_add((ring - 1).saturating_mul(params.ring_beat_ms))
    }
}

/// Plan the ripple for a click at `pointer`.
///
/// With `reduced` set only the origin cell is planned; everything else is
/// dropped rather than sped up.
pub fn plan_ripple(
    pointer: Vec2,
    grid: &GridSpec,
    params: &RippleSettings,
    accent: Rgb,
    reduced: bool,
) -> RipplePlan {
    let Some(origin) = grid.cell_at(pointer) else {
        return RipplePlan::default();
    };

    // Keyed by delay so bursts come out sorted
    let mut bursts: BTreeMap<u32, Vec<RippleCell>> = BTreeMap::new();

    match params.mode {
        WaveMode::IndexRings => {
            for key in grid.cells() {
                let dr = key.row as f32 - origin.row as f32;
                let dc = key.col as f32 - origin.col as f32;
                let distance = dr.hypot(dc);
                let ring = distance.floor() as u32;
                if reduced && ring != 0 {
                    continue;
                }
                let color = accent.with_alpha(ring_alpha(distance, params));
                bursts
                    .entry(ring_delay_ms(ring, params))
                    .or_default()
                    .push(RippleCell { key, color });
            }
        }
        WaveMode::PixelWavefront => {
            let ring_step = grid.cell_width.min(grid.cell_height);
            // Pixels travelled per millisecond
            let wave_speed = ring_step / params.ring_beat_ms.max(1) as f32;
            for key in grid.cells() {
                let is_origin = key == origin;
                if reduced && !is_origin {
                    continue;
                }
                let distance = pointer.distance(grid.cell_center(key));
                let rings = distance / ring_step;
                let delay_ms = if is_origin {
                    0
                } else {
                    (params.base_delay_ms as f32 + distance / wave_speed).round() as u32
                };
                let color = accent.with_alpha(ring_alpha(rings, params));
                bursts
                    .entry(delay_ms)
                    .or_default()
                    .push(RippleCell { key, color });
            }
        }
    }

    RipplePlan {
        origin: Some(origin),
        bursts: bursts
            .into_iter()
            .map(|(delay_ms, cells)| RippleBurst { delay_ms, cells })
            .collect(),
    }
}
