//! Browser [`Platform`] binding over `web-sys`
//!
//! Visibility comes from a native `IntersectionObserver` per host. The
//! render-settle step is a microtask spawned with `wasm-bindgen-futures`,
//! which runs after the current task's DOM updates have been applied.
//!
//! [`WebFocusDirective`] exports the attach/detach hooks to JavaScript:
//!
//! ```text
//! const focus = new FocusDirective();
//! focus.attach(formElement, { target: "#email" });
//! focus.detach(formElement);
//! ```

use js_sys::{Array, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement, IntersectionObserver,
    IntersectionObserverEntry,
};

use crate::directive::FocusDirective;
use crate::error::{FocusError, Result};
use crate::options::{FocusConfig, PartialFocusOptions};
use crate::platform::{
    FocusRequest, ObservationHandle, Platform, RenderTask, TextControl, VisibilityCallback,
    VisibilityEntry,
};

/// The browser's live document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebPlatform;

/// A native observer plus the closure it calls into
pub struct WebObserver {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array, IntersectionObserver)>,
}

impl ObservationHandle for WebObserver {
    fn disconnect(&mut self) {
        self.observer.disconnect();
    }
}

fn js_reason(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

fn invalid_selector(selector: &str, err: JsValue) -> FocusError {
    FocusError::InvalidSelector {
        selector: selector.to_string(),
        reason: js_reason(&err),
    }
}

impl Platform for WebPlatform {
    type Element = Element;
    type Observer = WebObserver;

    fn matches(&self, element: &Element, selector: &str) -> Result<bool> {
        element
            .matches(selector)
            .map_err(|err| invalid_selector(selector, err))
    }

    fn query_selector(&self, root: &Element, selector: &str) -> Result<Option<Element>> {
        root.query_selector(selector)
            .map_err(|err| invalid_selector(selector, err))
    }

    fn text_control(&self, element: &Element) -> Option<TextControl> {
        if element.is_instance_of::<HtmlInputElement>() {
            Some(TextControl::Input)
        } else if element.is_instance_of::<HtmlTextAreaElement>() {
            Some(TextControl::TextArea)
        } else {
            None
        }
    }

    fn focus(&self, element: &Element, request: FocusRequest) {
        let Some(element) = element.dyn_ref::<HtmlElement>() else {
            return;
        };
        let result = if request.prevent_scroll {
            let options = web_sys::FocusOptions::new();
            options.set_prevent_scroll(true);
            element.focus_with_options(&options)
        } else {
            element.focus()
        };
        if let Err(err) = result {
            tracing::debug!("focus failed: {}", js_reason(&err));
        }
    }

    fn is_connected(&self, element: &Element) -> bool {
        element.is_connected()
    }

    fn value(&self, element: &Element) -> String {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn select(&self, element: &Element) {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.select();
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.select();
        }
    }

    fn set_selection_range(&self, element: &Element, start: u32, end: u32) {
        // Inputs such as checkboxes reject selection ranges
        let result = if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_selection_range(start, end)
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_selection_range(start, end)
        } else {
            Ok(())
        };
        if let Err(err) = result {
            tracing::trace!("selection range not supported: {}", js_reason(&err));
        }
    }

    fn observe(
        &self,
        element: &Element,
        mut callback: VisibilityCallback<Self>,
    ) -> Result<WebObserver> {
        let closure = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, _observer: IntersectionObserver| {
                let entries: Vec<VisibilityEntry<Element>> = entries
                    .iter()
                    .map(|value| value.unchecked_into::<IntersectionObserverEntry>())
                    .map(|entry| VisibilityEntry {
                        target: entry.target(),
                        is_intersecting: entry.is_intersecting(),
                        intersection_ratio: entry.intersection_ratio(),
                    })
                    .collect();
                callback(&WebPlatform, entries.as_slice());
            },
        );

        let observer = IntersectionObserver::new(closure.as_ref().unchecked_ref())
            .map_err(|err| FocusError::Observe(js_reason(&err)))?;
        observer.observe(element);

        Ok(WebObserver {
            observer,
            _callback: closure,
        })
    }

    fn after_render(&self, task: RenderTask<Self>) {
        wasm_bindgen_futures::spawn_local(async move {
            task(&WebPlatform);
        });
    }
}

/// Read an attachment value coming from JavaScript
///
/// Booleans are the shorthand; anything else is read as an options object
/// with optional `target` (string) and `enabled` (boolean) properties.
pub fn config_from_js(value: &JsValue) -> FocusConfig {
    if let Some(enabled) = value.as_bool() {
        return FocusConfig::Toggle(enabled);
    }
    if !value.is_object() {
        return FocusConfig::Options(PartialFocusOptions::default());
    }
    let field = |name: &str| Reflect::get(value, &JsValue::from_str(name)).ok();
    FocusConfig::Options(PartialFocusOptions {
        target: field("target").and_then(|v| v.as_string()),
        enabled: field("enabled").and_then(|v| v.as_bool()),
    })
}

/// JavaScript-facing attach/detach hooks
#[wasm_bindgen(js_name = FocusDirective)]
pub struct WebFocusDirective {
    inner: FocusDirective<WebPlatform>,
}

impl Default for WebFocusDirective {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_class = FocusDirective)]
impl WebFocusDirective {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: FocusDirective::new(WebPlatform),
        }
    }

    /// Call when `element` is inserted into the document
    pub fn attach(&mut self, element: Element, value: JsValue) {
        self.inner.on_attach(element, config_from_js(&value));
    }

    /// Call when `element` is removed from the document
    pub fn detach(&mut self, element: Element) {
        self.inner.on_detach(&element);
    }

    #[wasm_bindgen(js_name = isAttached)]
    pub fn is_attached(&self, element: Element) -> bool {
        self.inner.is_attached(&element)
    }
}
