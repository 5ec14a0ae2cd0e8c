//! Scheduled ripple: lights planned cells and puts them out again

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;

use super::color::{Rgb, Rgba};
use super::grid::{CellKey, GridSpec};
use super::wave::{RippleCell, plan_ripple};
use crate::settings::RippleSettings;
use crate::timer::{Scheduler, TimerBatch};

/// Cells currently flashing, with their colour
#[derive(Debug, Default)]
pub struct FlashBoard {
    lit: HashMap<CellKey, Rgba>,
    /// Set on every change, cleared by the presentation layer
    dirty: bool,
}

impl FlashBoard {
    pub fn color(&self, key: CellKey) -> Option<Rgba> {
        self.lit.get(&key).copied()
    }

    pub fn is_lit(&self, key: CellKey) -> bool {
        self.lit.contains_key(&key)
    }

    pub fn lit_count(&self) -> usize {
        self.lit.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &Rgba)> {
        self.lit.iter()
    }

    fn light(&mut self, cells: &[RippleCell]) {
        for cell in cells {
            self.lit.insert(cell.key, cell.color);
        }
        self.dirty = true;
    }

    fn extinguish(&mut self, keys: &[CellKey]) {
        for key in keys {
            self.lit.remove(key);
        }
        self.dirty = true;
    }

    fn clear(&mut self) {
        if !self.lit.is_empty() {
            self.lit.clear();
            self.dirty = true;
        }
    }

    /// Returns true once per batch of changes
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// Click ripple driver. A new click replaces the previous ripple entirely.
pub struct RippleEffect<S: Scheduler + Clone + 'static> {
    timers: TimerBatch<S>,
    board: Rc<RefCell<FlashBoard>>,
    params: RippleSettings,
    accent: Rgb,
    reduced: bool,
}

impl<S: Scheduler + Clone + 'static> RippleEffect<S> {
    pub fn new(scheduler: S, params: RippleSettings, accent: Rgb) -> Self {
        Self {
            timers: TimerBatch::new(scheduler),
            board: Rc::new(RefCell::new(FlashBoard::default())),
            params,
            accent,
            reduced: false,
        }
    }

    pub fn set_reduced(&mut self, reduced: bool) {
        self.reduced = reduced;
    }

    pub fn board(&self) -> Ref<'_, FlashBoard> {
        self.board.borrow()
    }

    pub fn take_dirty(&self) -> bool {
        self.board.borrow_mut().take_dirty()
    }

    /// Timers still outstanding for the current ripple
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Start a ripple at `pointer`. Returns the number of cells scheduled;
    /// zero if the click missed the grid (the previous ripple is then left
    /// untouched).
    pub fn trigger(&mut self, pointer: Vec2, grid: &GridSpec) -> usize {
        let plan = plan_ripple(pointer, grid, &self.params, self.accent, self.reduced);
        if plan.is_empty() {
            return 0;
        }

        self.cancel();

        let scheduled = plan.cell_count();
        let flash_ms = self.params.flash_ms;
        for burst in plan.bursts {
            let board = Rc::clone(&self.board);
            let timers = self.timers.clone();
            self.timers.schedule(burst.delay_ms, move || {
                board.borrow_mut().light(&burst.cells);
                let keys: Vec<CellKey> = burst.cells.iter().map(|c| c.key).collect();
                timers.schedule(flash_ms, move || board.borrow_mut().extinguish(&keys));
            });
        }

        scheduled
    }

    /// Drop every pending timer and darken the board
    pub fn cancel(&mut self) {
        self.timers.cancel_all();
        self.board.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualScheduler;

    fn setup() -> (ManualScheduler, RippleEffect<ManualScheduler>, GridSpec) {
        let clock = ManualScheduler::new();
        let effect = RippleEffect::new(
            clock.clone(),
            RippleSettings::default(),
            Rgb::new(0xff, 0x2a, 0xa1),
        );
        (clock, effect, GridSpec::from_viewport(1200.0, 720.0, 120.0))
    }

    #[test]
    fn test_ripple_lights_then_clears() {
        let (clock, mut effect, grid) = setup();
        let scheduled = effect.trigger(Vec2::new(60.0, 60.0), &grid);
        assert_eq!(scheduled, grid.cell_count());

        clock.advance(0);
        assert!(effect.board().is_lit(CellKey::new(0, 0)));
        assert!(!effect.board().is_lit(CellKey::new(0, 1)));
        assert!(effect.take_dirty());
        assert!(!effect.take_dirty());

        clock.advance(50);
        assert!(effect.board().is_lit(CellKey::new(0, 1)));

        // Everything is dark once the last ring has flashed
        clock.advance(10_000);
        assert_eq!(effect.board().lit_count(), 0);
        assert_eq!(effect.pending_timers(), 0);
    }

    #[test]
    fn test_second_click_replaces_first() {
        let (clock, mut effect, grid) = setup();
        effect.trigger(Vec2::new(60.0, 60.0), &grid);
        clock.advance(60);
        assert!(effect.board().is_lit(CellKey::new(0, 0)));

        // Far corner
        effect.trigger(Vec2::new(1190.0, 710.0), &grid);
        assert_eq!(effect.board().lit_count(), 0);

        clock.advance(0);
        let board = effect.board();
        assert_eq!(board.lit_count(), 1);
        assert!(board.is_lit(CellKey::new(5, 9)));
        assert!(!board.is_lit(CellKey::new(0, 0)));
    }

    #[test]
    fn test_reduced_only_flashes_origin() {
        let (clock, mut effect, grid) = setup();
        effect.set_reduced(true);
        assert_eq!(effect.trigger(Vec2::new(300.0, 300.0), &grid), 1);

        clock.advance(0);
        assert_eq!(effect.board().lit_count(), 1);
        clock.advance(200);
        assert_eq!(effect.board().lit_count(), 0);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_miss_keeps_running_ripple() {
        let (clock, mut effect, grid) = setup();
        effect.trigger(Vec2::new(60.0, 60.0), &grid);
        assert_eq!(effect.trigger(Vec2::new(-5.0, 60.0), &grid), 0);
        clock.advance(0);
        assert!(effect.board().is_lit(CellKey::new(0, 0)));
    }

    #[test]
    fn test_cancel_darkens_board() {
        let (clock, mut effect, grid) = setup();
        effect.trigger(Vec2::new(60.0, 60.0), &grid);
        clock.advance(100);
        effect.cancel();
        assert_eq!(effect.board().lit_count(), 0);
        assert_eq!(effect.pending_timers(), 0);
        clock.advance(10_000);
        assert_eq!(effect.board().lit_count(), 0);
    }
}
