//! `prefers-reduced-motion` media query

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::MediaQueryList;

const QUERY: &str = "(prefers-reduced-motion: reduce)";

pub struct ReducedMotionQuery {
    list: MediaQueryList,
}

impl ReducedMotionQuery {
    /// `None` when the browser has no `matchMedia`
    pub fn new(window: &web_sys::Window) -> Option<Self> {
        let list = window.match_media(QUERY).ok().flatten()?;
        Some(Self { list })
    }

    pub fn matches(&self) -> bool {
        self.list.matches()
    }

    /// Call `on_change` with the new value whenever the preference flips
    pub fn on_change(&self, mut on_change: impl FnMut(bool) + 'static) {
        let list = self.list.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            on_change(list.matches());
        });
        if let Err(e) = self
            .list
            .add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())
        {
            log::warn!("Could not watch {}: {:?}", QUERY, e);
        }
        closure.forget();
    }
}
