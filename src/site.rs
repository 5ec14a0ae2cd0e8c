//! Site state shared by every event handler
//!
//! One `Site` owns the transition controller, the input normalizer, the
//! grid and ripple, and the menu/loading/motion flags. Handlers never touch
//! those pieces directly, so the controller's lock and index are the only
//! source of truth for navigation.

use std::cell::Ref;

use glam::Vec2;

use crate::error::SiteResult;
use crate::nav::{
    Direction, InputGate, InputNormalizer, NavCommand, NavInput, PhaseOutcome, PhaseRunner,
    PhaseTicket, RequestOutcome, SectionDeck, TransitionController, active_section,
};
use crate::ripple::{CellKey, FlashBoard, GridSpec, RippleEffect};
use crate::settings::Settings;
use crate::timer::Scheduler;

/// Response to an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// Call `preventDefault()` on the originating event
    pub suppress_default: bool,
    /// Set when the event produced a section request
    pub outcome: Option<RequestOutcome>,
}

pub struct Site<S: Scheduler + Clone + 'static> {
    controller: TransitionController,
    normalizer: InputNormalizer,
    ripple: RippleEffect<S>,
    settings: Settings,
    grid: GridSpec,
    hover: Option<CellKey>,
    menu_open: bool,
    system_reduced_motion: bool,
}

impl<S: Scheduler + Clone + 'static> Site<S> {
    /// Build a site over `sections`. It starts loading; call
    /// `set_loading(false)` once the page is wired up.
    pub fn new<I, T>(sections: I, settings: Settings, scheduler: S) -> SiteResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        settings.validate()?;
        let deck = SectionDeck::new(sections, &settings.transition)?;
        let ripple = RippleEffect::new(scheduler, settings.ripple.clone(), settings.accent());

        let mut site = Self {
            controller: TransitionController::new(deck),
            normalizer: InputNormalizer::new(&settings.input),
            ripple,
            settings,
            grid: GridSpec::EMPTY,
            hover: None,
            menu_open: false,
            system_reduced_motion: false,
        };
        site.apply_motion();
        Ok(site)
    }

    pub fn controller(&self) -> &TransitionController {
        &self.controller
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn hover(&self) -> Option<CellKey> {
        self.hover
    }

    pub fn flashes(&self) -> Ref<'_, FlashBoard> {
        self.ripple.board()
    }

    /// True once after the flash board changed
    pub fn take_flash_changes(&self) -> bool {
        self.ripple.take_dirty()
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn reduced_motion(&self) -> bool {
        self.controller.reduce_motion()
    }

    fn gate(&self) -> InputGate {
        InputGate {
            loading: self.controller.is_loading(),
            menu_open: self.menu_open,
            transitioning: self.controller.is_locked(),
        }
    }

    /// Route a wheel/key/touch event through the normalizer
    pub fn handle_input<R>(&mut self, input: NavInput<'_>, runner: &mut R) -> Dispatch
    where
        R: PhaseRunner + ?Sized,
    {
        let gate = self.gate();
        let verdict = self.normalizer.normalize(input, gate);
        let outcome = verdict.command.and_then(|command| self.execute(command, runner));
        Dispatch {
            suppress_default: verdict.suppress_default,
            outcome,
        }
    }

    fn execute<R>(&mut self, command: NavCommand, runner: &mut R) -> Option<RequestOutcome>
    where
        R: PhaseRunner + ?Sized,
    {
        let current = self.controller.current_index();
        let target = command.resolve(current, self.controller.deck().len())?;
        Some(self.controller.request_section(target, runner))
    }

    /// Prev/next buttons
    pub fn step<R>(&mut self, direction: Direction, runner: &mut R) -> Option<RequestOutcome>
    where
        R: PhaseRunner + ?Sized,
    {
        self.execute(NavCommand::Step(direction), runner)
    }

    /// Menu link: close the menu, then go straight to `index`
    pub fn jump_to<R>(&mut self, index: usize, runner: &mut R) -> RequestOutcome
    where
        R: PhaseRunner + ?Sized,
    {
        self.menu_open = false;
        self.controller.request_section(index, runner)
    }

    /// Completion signal from the animation engine (or the watchdog)
    pub fn phase_finished<R>(&mut self, ticket: PhaseTicket, runner: &mut R) -> PhaseOutcome
    where
        R: PhaseRunner + ?Sized,
    {
        self.controller.phase_finished(ticket, runner)
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu_open = !self.menu_open;
        self.menu_open
    }

    pub fn set_menu_open(&mut self, open: bool) {
        self.menu_open = open;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.controller.set_loading(loading);
    }

    /// `prefers-reduced-motion` changed
    pub fn set_system_reduced_motion(&mut self, reduced: bool) {
        self.system_reduced_motion = reduced;
        self.apply_motion();
    }

    fn apply_motion(&mut self) {
        let reduced = self
            .settings
            .effective_reduced_motion(self.system_reduced_motion);
        if reduced != self.controller.reduce_motion() {
            log::info!("Reduced motion: {}", reduced);
        }
        self.controller.set_reduce_motion(reduced);
        self.ripple.set_reduced(reduced);
    }

    /// Scroll spy for reduced motion, where sections scroll natively
    pub fn observe_scroll(&mut self, center_y: f64, section_offsets: &[f64]) -> bool {
        if !self.controller.reduce_motion() {
            return false;
        }
        let index = active_section(center_y, section_offsets);
        self.controller.observe(index)
    }

    /// Viewport resized; returns true if the grid changed shape
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        let grid = GridSpec::from_viewport(width, height, self.settings.ripple.cell_size);
        let reshaped = grid.rows != self.grid.rows || grid.cols != self.grid.cols;
        self.grid = grid;
        if reshaped {
            self.hover = None;
            self.ripple.cancel();
            log::debug!("grid {}x{}", grid.cols, grid.rows);
        }
        reshaped
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<CellKey> {
        if let Some(key) = self.grid.cell_at(Vec2::new(x, y)) {
            self.hover = Some(key);
        }
        self.hover
    }

    pub fn pointer_leave(&mut self) {
        self.hover = None;
    }

    /// Click on the background grid; returns the number of cells scheduled
    pub fn click(&mut self, x: f32, y: f32) -> usize {
        self.ripple.trigger(Vec2::new(x, y), &self.grid)
    }

    /// Cancel every pending ripple timer (page teardown)
    pub fn shutdown(&mut self) {
        self.ripple.cancel();
    }
}
