//! Phase animations on the Web Animations API

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::Element;

use super::timers::BrowserScheduler;
use crate::nav::{PhaseMotion, PhaseRunner, PhaseTicket};
use crate::timer::TimerBatch;

// Browsers without Element.animate finish on the next tick so the
// controller never waits on an animation that cannot run.
#[wasm_bindgen(inline_js = "
    export function play_phase(el, fromOpacity, fromY, toOpacity, toY, duration, easing, done) {
        if (typeof el.animate !== 'function') {
            setTimeout(done, 0);
            return;
        }
        const anim = el.animate(
            [
                { opacity: fromOpacity, transform: `translateY(${fromY}px)` },
                { opacity: toOpacity, transform: `translateY(${toY}px)` },
            ],
            { duration, easing, fill: 'forwards' },
        );
        anim.onfinish = () => done();
    }
")]
extern "C" {
    fn play_phase(
        el: &Element,
        from_opacity: f32,
        from_y: f32,
        to_opacity: f32,
        to_y: f32,
        duration: u32,
        easing: &str,
        done: &js_sys::Function,
    );
}

/// Receives finished phase tickets
pub type PhaseNotify = Rc<dyn Fn(PhaseTicket)>;

/// Plays section motions on each section's content element
pub struct WaapiRunner {
    targets: Vec<Element>,
    notify: PhaseNotify,
    watchdog: TimerBatch<BrowserScheduler>,
    phase_timeout_ms: Option<u32>,
}

impl WaapiRunner {
    /// `targets[i]` is the element animated for section `i`
    pub fn new(
        targets: Vec<Element>,
        notify: PhaseNotify,
        scheduler: BrowserScheduler,
        phase_timeout_ms: Option<u32>,
    ) -> Self {
        Self {
            targets,
            notify,
            watchdog: TimerBatch::new(scheduler),
            phase_timeout_ms,
        }
    }

    pub fn target(&self, section: usize) -> Option<&Element> {
        self.targets.get(section)
    }

    fn finish_later(&self, delay_ms: u32, ticket: PhaseTicket) {
        let notify = Rc::clone(&self.notify);
        self.watchdog.schedule(delay_ms, move || notify(ticket));
    }
}

impl PhaseRunner for WaapiRunner {
    fn play(&mut self, section: usize, motion: &PhaseMotion, ticket: PhaseTicket) {
        // The previous phase is done; its watchdog is moot
        self.watchdog.cancel_all();

        let Some(el) = self.targets.get(section) else {
            log::warn!("no element for section {}, skipping animation", section);
            self.finish_later(0, ticket);
            return;
        };

        let notify = Rc::clone(&self.notify);
        let done = Closure::once_into_js(move || notify(ticket));
        play_phase(
            el,
            motion.from.opacity,
            motion.from.offset_y,
            motion.to.opacity,
            motion.to.offset_y,
            motion.duration_ms,
            motion.ease.css(),
            done.unchecked_ref(),
        );

        if let Some(timeout) = self.phase_timeout_ms {
            self.finish_later(motion.duration_ms.saturating_add(timeout), ticket);
        }
    }
}
