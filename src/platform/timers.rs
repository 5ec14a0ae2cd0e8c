//! `setTimeout`-backed scheduler

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::error::{SiteError, SiteResult};
use crate::timer::{Scheduler, TimerCallback};

#[derive(Clone)]
pub struct BrowserScheduler {
    window: web_sys::Window,
}

impl BrowserScheduler {
    pub fn new() -> SiteResult<Self> {
        let window = web_sys::window().ok_or_else(|| SiteError::Dom("no window".into()))?;
        Ok(Self { window })
    }
}

impl Scheduler for BrowserScheduler {
    type Handle = i32;

    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Option<i32> {
        // Freed by wasm-bindgen when it runs; a cleared timer leaks its box
        let closure = Closure::once_into_js(move || callback());
        let delay = delay_ms.min(i32::MAX as u32) as i32;
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(closure.unchecked_ref(), delay)
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("setTimeout failed: {:?}", e);
                None
            }
        }
    }

    fn clear_timeout(&self, handle: i32) {
        self.window.clear_timeout_with_handle(handle);
    }
}
