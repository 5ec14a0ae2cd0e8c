//! DOM lookups and listener helpers

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::convert::FromWasmAbi;
use web_sys::{AddEventListenerOptions, Document, Element, EventTarget, HtmlElement, Window};

use crate::error::{SiteError, SiteResult};

pub fn window() -> SiteResult<Window> {
    web_sys::window().ok_or_else(|| SiteError::Dom("no window".into()))
}

pub fn document() -> SiteResult<Document> {
    window()?
        .document()
        .ok_or_else(|| SiteError::Dom("no document".into()))
}

/// First element matching `selector`, or an error naming it
pub fn require(document: &Document, selector: &str) -> SiteResult<Element> {
    document
        .query_selector(selector)
        .ok()
        .flatten()
        .ok_or_else(|| SiteError::Dom(format!("missing element `{}`", selector)))
}

/// All elements matching `selector`, in document order
pub fn select_all(root: &Document, selector: &str) -> Vec<HtmlElement> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect()
}

/// True if the event started inside an element matching `selector`
pub fn target_within(event: &web_sys::Event, selector: &str) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(selector).ok().flatten())
        .is_some()
}

/// Attach a listener for the lifetime of the page
pub fn listen<E>(target: &EventTarget, name: &str, handler: impl FnMut(E) + 'static) -> SiteResult<()>
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    target
        .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        .map_err(|e| SiteError::Dom(format!("listen {}: {:?}", name, e)))?;
    closure.forget();
    Ok(())
}

/// Like [`listen`], but non-passive so the handler may `preventDefault()`
pub fn listen_active<E>(
    target: &EventTarget,
    name: &str,
    handler: impl FnMut(E) + 'static,
) -> SiteResult<()>
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    let options = AddEventListenerOptions::new();
    options.set_passive(false);
    target
        .add_event_listener_with_callback_and_add_event_listener_options(
            name,
            closure.as_ref().unchecked_ref(),
            &options,
        )
        .map_err(|e| SiteError::Dom(format!("listen {}: {:?}", name, e)))?;
    closure.forget();
    Ok(())
}

/// Toggle a class, ignoring DOM errors
pub fn set_class(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}
