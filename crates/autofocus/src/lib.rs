//! Autofocus
//!
//! Moves keyboard focus into a form when it scrolls into view. Attach the
//! behavior to a host element; each time the host starts intersecting the
//! viewport, the first element matching the configured selector (the host
//! itself, or a descendant) is focused. Text fields additionally get their
//! content selected once the next render has settled.
//!
//! - **Options**: boolean shorthand or partial options, resolved against defaults
//! - **Locator**: selector lookup with a safe fallback for invalid selectors
//! - **Actuator**: scroll-free focus plus deferred selection
//! - **Watcher / Directive**: observer lifecycle per host element
//! - **Platform**: the DOM, intersection and scheduling primitives consumed
//!
//! # Example
//!
//! ```rust
//! use autofocus::FocusDirective;
//! use autofocus_dom::Page;
//!
//! let page = Page::new();
//! let (form, input) = {
//!     let mut doc = page.document_mut();
//!     let root = doc.root();
//!     let form = doc.create_element("form");
//!     let input = doc.create_element("input");
//!     doc.append_child(root, form);
//!     doc.append_child(form, input);
//!     doc.set_value(input, "hello");
//!     (form, input)
//! };
//!
//! let mut directive = FocusDirective::new(page.clone());
//! directive.on_attach(form, true);
//!
//! page.set_intersecting(form, true);
//! page.tick();
//!
//! assert_eq!(page.document().focused(), Some(input));
//! assert_eq!(page.document().selection(input).map(|s| (s.start, s.end)), Some((0, 5)));
//!
//! directive.on_detach(&form);
//! ```

pub mod actuator;
pub mod directive;
pub mod error;
pub mod headless;
pub mod locator;
pub mod options;
pub mod platform;
pub mod watcher;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use actuator::focus_target;
pub use directive::FocusDirective;
pub use error::{FocusError, Result};
pub use headless::HeadlessObserver;
pub use locator::find_target;
pub use options::{FocusConfig, FocusOptions, PartialFocusOptions, DEFAULT_TARGET};
pub use platform::{
    FocusRequest, ObservationHandle, Platform, RenderTask, TextControl, VisibilityCallback,
    VisibilityEntry,
};
pub use watcher::VisibilityWatcher;
