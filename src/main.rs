//! SocialTag site entry point
//!
//! Wires the site core to the page and keeps the DOM in sync with it.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_site {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent, WheelEvent};

    use socialtag_site::consts::SECTIONS;
    use socialtag_site::nav::{Direction, NavInput, PhaseOutcome, PhaseTicket, RequestOutcome};
    use socialtag_site::platform::dom::{self, listen, listen_active, set_class};
    use socialtag_site::platform::{BrowserScheduler, PhaseNotify, ReducedMotionQuery, WaapiRunner};
    use socialtag_site::ripple::CellKey;
    use socialtag_site::timer::apply_when_free;
    use socialtag_site::{Settings, Site, SiteError, SiteResult};

    /// What the DOM currently reflects
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct View {
        current: usize,
        locked: bool,
        menu_open: bool,
        reduced: bool,
        hover: Option<CellKey>,
    }

    /// Page instance holding all state
    struct App {
        site: Site<BrowserScheduler>,
        runner: WaapiRunner,
        document: Document,
        sections: Vec<HtmlElement>,
        cells: Vec<HtmlElement>,
        shown: Option<View>,
    }

    impl App {
        /// Route one navigation event; returns whether to `preventDefault()`
        fn dispatch(&mut self, input: NavInput<'_>) -> bool {
            let dispatch = self.site.handle_input(input, &mut self.runner);
            if let Some(outcome) = dispatch.outcome {
                self.after_request(outcome);
            }
            dispatch.suppress_default
        }

        fn after_request(&mut self, outcome: RequestOutcome) {
            // Reduced motion commits at once; bring the section into view
            if let RequestOutcome::Committed { index } = outcome {
                if let Some(section) = self.sections.get(index) {
                    section.scroll_into_view();
                }
            }
        }

        fn step(&mut self, direction: Direction) {
            if let Some(outcome) = self.site.step(direction, &mut self.runner) {
                self.after_request(outcome);
            }
        }

        fn jump_to(&mut self, index: usize) {
            let outcome = self.site.jump_to(index, &mut self.runner);
            self.after_request(outcome);
        }

        /// Resize the grid to the viewport, rebuilding cells if its shape changed
        fn resize_grid(&mut self) -> SiteResult<()> {
            let window = dom::window()?;
            let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            if !self.site.resize(width as f32, height as f32) {
                return Ok(());
            }

            let grid = *self.site.grid();
            let container = dom::require(&self.document, ".grid")?;
            container.set_inner_html("");
            let _ = container.set_attribute(
                "style",
                &format!(
                    "grid-template-columns: repeat({}, 1fr); grid-template-rows: repeat({}, 1fr)",
                    grid.cols, grid.rows
                ),
            );

            self.cells.clear();
            for _ in 0..grid.cell_count() {
                let cell = self
                    .document
                    .create_element("div")
                    .map_err(|e| SiteError::Dom(format!("create cell: {:?}", e)))?;
                cell.set_class_name("cell");
                container
                    .append_child(&cell)
                    .map_err(|e| SiteError::Dom(format!("append cell: {:?}", e)))?;
                let cell = cell
                    .dyn_into::<HtmlElement>()
                    .map_err(|_| SiteError::Dom("cell is not an HtmlElement".into()))?;
                self.cells.push(cell);
            }

            // Force a full view refresh on the new cells
            self.shown = None;
            log::info!("Grid {}x{}", grid.cols, grid.rows);
            Ok(())
        }

        /// Bring the DOM up to date with the site state
        fn sync(&mut self) {
            if self.site.take_flash_changes() {
                self.sync_flashes();
            }

            let controller = self.site.controller();
            let view = View {
                current: controller.current_index(),
                locked: controller.is_locked(),
                menu_open: self.site.menu_open(),
                reduced: self.site.reduced_motion(),
                hover: self.site.hover(),
            };
            if self.shown == Some(view) {
                return;
            }
            let previous = self.shown.replace(view);

            let cols = self.site.grid().cols;
            if let Some(old) = previous.and_then(|v| v.hover) {
                if let Some(cell) = self.cells.get(old.index(cols)) {
                    set_class(cell, "hover", false);
                }
            }
            if let Some(new) = view.hover {
                if let Some(cell) = self.cells.get(new.index(cols)) {
                    set_class(cell, "hover", true);
                }
            }

            for (i, section) in self.sections.iter().enumerate() {
                set_class(section, "active", i == view.current);
            }

            if let Ok(root) = dom::require(&self.document, ".app") {
                set_class(&root, "reduced", view.reduced);
                set_class(&root, "transitioning", view.locked);
                set_class(&root, "menu-open", view.menu_open);
            }

            if let Ok(label) = dom::require(&self.document, ".section-label") {
                label.set_text_content(Some(self.site.controller().current_id()));
            }

            let controller = self.site.controller();
            for (selector, enabled) in [
                ("[data-direction=\"up\"]", controller.can_go_prev()),
                ("[data-direction=\"down\"]", controller.can_go_next()),
            ] {
                if let Ok(button) = dom::require(&self.document, selector) {
                    if enabled {
                        let _ = button.remove_attribute("disabled");
                    } else {
                        let _ = button.set_attribute("disabled", "");
                    }
                }
            }
        }

        fn sync_flashes(&self) {
            let flashes = self.site.flashes();
            let cols = self.site.grid().cols.max(1);
            for (i, cell) in self.cells.iter().enumerate() {
                let key = CellKey::new(i as u32 / cols, i as u32 % cols);
                let style = cell.style();
                match flashes.color(key) {
                    Some(color) => {
                        set_class(cell, "flash", true);
                        let _ = style.set_property("--flash-color", &color.to_css());
                    }
                    None => {
                        set_class(cell, "flash", false);
                        let _ = style.remove_property("--flash-color");
                    }
                }
            }
        }

        /// Reduced-motion scroll spy
        fn observe_scroll(&mut self) {
            if !self.site.reduced_motion() {
                return;
            }
            let Some(window) = web_sys::window() else { return };
            let scroll_y = window.scroll_y().unwrap_or(0.0);
            let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            let offsets: Vec<f64> = self
                .sections
                .iter()
                .map(|s| f64::from(s.offset_top()))
                .collect();
            self.site.observe_scroll(scroll_y + height / 2.0, &offsets);
        }
    }

    /// Completion callback handed to the animation runner
    ///
    /// A ticket arriving while a handler holds the app is delivered on a
    /// later tick, never dropped.
    fn phase_notify(weak: Weak<RefCell<App>>, scheduler: BrowserScheduler) -> PhaseNotify {
        Rc::new(move |ticket: PhaseTicket| {
            apply_when_free(weak.clone(), scheduler.clone(), move |app: &mut App| {
                if let PhaseOutcome::Committed { index } =
                    app.site.phase_finished(ticket, &mut app.runner)
                {
                    log::debug!("Transition settled on {}", index);
                }
            });
        })
    }

    pub fn run() -> SiteResult<()> {
        log::info!("SocialTag site starting...");

        let window = dom::window()?;
        let document = dom::document()?;

        let settings = Settings::load();
        // Write back with every field filled in
        settings.save();
        let scheduler = BrowserScheduler::new()?;
        let mut site = Site::new(SECTIONS, settings.clone(), scheduler.clone())?;

        let motion = ReducedMotionQuery::new(&window);
        if let Some(query) = &motion {
            site.set_system_reduced_motion(query.matches());
        }

        let sections = dom::select_all(&document, ".snap-section");
        if sections.len() != SECTIONS.len() {
            log::warn!(
                "Page has {} sections, expected {}",
                sections.len(),
                SECTIONS.len()
            );
        }
        let targets: Vec<Element> = sections
            .iter()
            .map(|s| {
                s.query_selector(".panel-content")
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| s.clone().into())
            })
            .collect();

        let phase_timeout = settings.transition.phase_timeout_ms;
        let app = Rc::new_cyclic(|weak: &Weak<RefCell<App>>| {
            RefCell::new(App {
                site,
                runner: WaapiRunner::new(
                    targets,
                    phase_notify(weak.clone(), scheduler.clone()),
                    scheduler,
                    phase_timeout,
                ),
                document: document.clone(),
                sections,
                cells: Vec::new(),
                shown: None,
            })
        });

        app.borrow_mut().resize_grid()?;

        setup_input_handlers(&window, app.clone())?;
        setup_pointer_handlers(&document, app.clone())?;
        setup_controls(&document, app.clone())?;
        setup_lifecycle(&window, app.clone())?;

        if let Some(query) = motion {
            let app = app.clone();
            query.on_change(move |reduced| {
                app.borrow_mut().site.set_system_reduced_motion(reduced);
            });
        }

        // Hide loading indicator and start accepting navigation
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }
        app.borrow_mut().site.set_loading(false);

        request_animation_frame(app);

        log::info!("SocialTag site running!");
        Ok(())
    }

    fn setup_input_handlers(window: &web_sys::Window, app: Rc<RefCell<App>>) -> SiteResult<()> {
        // Wheel
        {
            let app = app.clone();
            listen_active(window, "wheel", move |event: WheelEvent| {
                let delta_y = event.delta_y();
                if app.borrow_mut().dispatch(NavInput::Wheel { delta_y }) {
                    event.prevent_default();
                }
            })?;
        }

        // Keyboard
        {
            let app = app.clone();
            listen(window, "keydown", move |event: KeyboardEvent| {
                if event.ctrl_key() || event.meta_key() || event.alt_key() {
                    return;
                }
                let key = event.key();
                if app.borrow_mut().dispatch(NavInput::Key(&key)) {
                    event.prevent_default();
                }
            })?;
        }

        // Touch start
        {
            let app = app.clone();
            listen(window, "touchstart", move |event: TouchEvent| {
                let touches = event.touches();
                if let Some(touch) = touches.get(0) {
                    app.borrow_mut().dispatch(NavInput::TouchStart {
                        y: f64::from(touch.client_y()),
                        touches: touches.length(),
                    });
                }
            })?;
        }

        // Touch move
        {
            let app = app.clone();
            listen_active(window, "touchmove", move |event: TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    let y = f64::from(touch.client_y());
                    if app.borrow_mut().dispatch(NavInput::TouchMove { y }) {
                        event.prevent_default();
                    }
                }
            })?;
        }

        // Touch end / cancel
        {
            let app = app.clone();
            listen(window, "touchend", move |_event: TouchEvent| {
                app.borrow_mut().dispatch(NavInput::TouchEnd);
            })?;
        }
        listen(window, "touchcancel", move |_event: TouchEvent| {
            app.borrow_mut().dispatch(NavInput::TouchCancel);
        })?;

        Ok(())
    }

    fn setup_pointer_handlers(document: &Document, app: Rc<RefCell<App>>) -> SiteResult<()> {
        let root = dom::require(document, ".app")?;

        // Hover cell
        {
            let app = app.clone();
            listen(&root, "pointermove", move |event: MouseEvent| {
                if dom::target_within(&event, ".content-block") {
                    return;
                }
                app.borrow_mut()
                    .site
                    .pointer_move(event.client_x() as f32, event.client_y() as f32);
            })?;
        }

        {
            let app = app.clone();
            listen(&root, "pointerleave", move |_event: MouseEvent| {
                app.borrow_mut().site.pointer_leave();
            })?;
        }

        // Ripple
        listen(&root, "click", move |event: MouseEvent| {
            if dom::target_within(&event, ".content-block") {
                return;
            }
            let cells = app
                .borrow_mut()
                .site
                .click(event.client_x() as f32, event.client_y() as f32);
            log::debug!("Ripple over {} cells", cells);
        })?;

        Ok(())
    }

    fn setup_controls(document: &Document, app: Rc<RefCell<App>>) -> SiteResult<()> {
        // Menu toggle
        if let Ok(button) = dom::require(document, ".menu") {
            let app = app.clone();
            listen(&button, "click", move |_event: MouseEvent| {
                let open = app.borrow_mut().site.toggle_menu();
                log::debug!("Menu open: {}", open);
            })?;
        }

        // Menu links
        for link in dom::select_all(document, ".menu-panel [data-section-index]") {
            let Some(index) = link
                .get_attribute("data-section-index")
                .and_then(|v| v.parse::<usize>().ok())
            else {
                log::warn!("Menu link without a valid data-section-index");
                continue;
            };
            let app = app.clone();
            listen(&link, "click", move |event: MouseEvent| {
                event.prevent_default();
                app.borrow_mut().jump_to(index);
            })?;
        }

        // Prev/next buttons
        for (selector, direction) in [
            ("[data-direction=\"up\"]", Direction::Up),
            ("[data-direction=\"down\"]", Direction::Down),
        ] {
            if let Ok(button) = dom::require(document, selector) {
                let app = app.clone();
                listen(&button, "click", move |_event: MouseEvent| {
                    app.borrow_mut().step(direction);
                })?;
            }
        }

        Ok(())
    }

    fn setup_lifecycle(window: &web_sys::Window, app: Rc<RefCell<App>>) -> SiteResult<()> {
        {
            let app = app.clone();
            listen(window, "resize", move |_event: web_sys::Event| {
                if let Err(e) = app.borrow_mut().resize_grid() {
                    log::warn!("Grid resize failed: {}", e);
                }
            })?;
        }

        {
            let app = app.clone();
            listen(window, "scroll", move |_event: web_sys::Event| {
                app.borrow_mut().observe_scroll();
            })?;
        }

        // Cancel pending ripple timers on teardown
        listen(window, "pagehide", move |_event: web_sys::Event| {
            app.borrow_mut().site.shutdown();
            log::info!("SocialTag site stopped");
        })?;

        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |_time: f64| {
            frame(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(app: Rc<RefCell<App>>) {
        app.borrow_mut().sync();
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }

    if let Err(e) = wasm_site::run() {
        log::error!("SocialTag site failed to start: {}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("SocialTag site (native) starting...");
    log::info!("The page runs in the browser - build for wasm32 and serve with `trunk serve`");

    println!("\nRunning navigation walkthrough...");
    match native_demo::run() {
        Ok(index) => println!("✓ Walkthrough finished on section {}", index),
        Err(e) => {
            eprintln!("walkthrough failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted run of the site core on a virtual clock
#[cfg(not(target_arch = "wasm32"))]
mod native_demo {
    use std::cell::RefCell;
    use std::rc::Rc;

    use socialtag_site::consts::SECTIONS;
    use socialtag_site::nav::{NavInput, PhaseMotion, PhaseRunner, PhaseTicket};
    use socialtag_site::timer::{ManualScheduler, TimerBatch};
    use socialtag_site::{Settings, Site, SiteResult};

    /// Reports each phase finished once its duration has elapsed
    struct ClockRunner {
        timers: TimerBatch<ManualScheduler>,
        finished: Rc<RefCell<Vec<PhaseTicket>>>,
    }

    impl PhaseRunner for ClockRunner {
        fn play(&mut self, section: usize, motion: &PhaseMotion, ticket: PhaseTicket) {
            log::info!(
                "  {:?} {} on section {} ({} ms)",
                ticket.phase,
                ticket.direction.as_str(),
                section,
                motion.duration_ms
            );
            let finished = Rc::clone(&self.finished);
            self.timers
                .schedule(motion.duration_ms, move || finished.borrow_mut().push(ticket));
        }
    }

    fn settle(site: &mut Site<ManualScheduler>, runner: &mut ClockRunner, clock: &ManualScheduler) {
        while site.controller().is_locked() {
            clock.advance(50);
            let done: Vec<PhaseTicket> = runner.finished.borrow_mut().drain(..).collect();
            for ticket in done {
                site.phase_finished(ticket, runner);
            }
        }
    }

    pub fn run() -> SiteResult<usize> {
        let clock = ManualScheduler::new();
        let mut site = Site::new(SECTIONS, Settings::default(), clock.clone())?;
        let mut runner = ClockRunner {
            timers: TimerBatch::new(clock.clone()),
            finished: Rc::default(),
        };
        site.resize(1280.0, 720.0);
        site.set_loading(false);

        let script = [
            NavInput::Wheel { delta_y: 3.0 },
            NavInput::Wheel { delta_y: 10.0 },
            NavInput::Key("End"),
            NavInput::Key("Home"),
            NavInput::TouchStart { y: 500.0, touches: 1 },
            NavInput::TouchMove { y: 475.0 },
            NavInput::TouchEnd,
            NavInput::TouchStart { y: 500.0, touches: 1 },
            NavInput::TouchMove { y: 440.0 },
            NavInput::TouchEnd,
        ];

        for input in script {
            let dispatch = site.handle_input(input, &mut runner);
            log::info!("{:?} -> {:?}", input, dispatch.outcome);
            settle(&mut site, &mut runner, &clock);
            log::info!(
                "  at section {} ({})",
                site.controller().current_index(),
                site.controller().current_id()
            );
        }

        let cells = site.click(640.0, 360.0);
        log::info!("Ripple scheduled over {} cells", cells);
        for _ in 0..4 {
            clock.advance(70);
            log::info!("  t={}ms lit={}", clock.now_ms(), site.flashes().lit_count());
        }
        site.shutdown();

        Ok(site.controller().current_index())
    }
}
