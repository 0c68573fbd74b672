//! Platform primitives consumed by the focus behavior
//!
//! A [`Platform`] bundles the three collaborators the behavior depends on:
//!
//! - DOM queries, focus and text selection
//! - viewport-intersection observation
//! - a render-settle scheduler for deferred continuations
//!
//! Callbacks and deferred tasks receive the platform by reference, so an
//! implementation can own its observers without forming reference cycles.

use std::fmt;

use crate::error::Result;

/// Options for a focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusRequest {
    /// Do not scroll the element into view
    pub prevent_scroll: bool,
}

impl FocusRequest {
    pub fn without_scroll() -> Self {
        Self {
            prevent_scroll: true,
        }
    }
}

/// Standard text-entry controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextControl {
    /// Single-line `<input>`
    Input,
    /// Multi-line `<textarea>`
    TextArea,
}

/// One visibility notification for an observed element
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityEntry<E> {
    pub target: E,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

/// Called with each batch of visibility notifications, in delivery order
pub type VisibilityCallback<P> =
    Box<dyn FnMut(&P, &[VisibilityEntry<<P as Platform>::Element>])>;

/// Continuation run after pending UI updates have been applied
pub type RenderTask<P> = Box<dyn FnOnce(&P)>;

/// An active visibility subscription
pub trait ObservationHandle {
    /// Stop delivering notifications. Calling it again is a no-op.
    fn disconnect(&mut self);
}

/// DOM, intersection and scheduling primitives of a host environment
pub trait Platform: Sized + 'static {
    /// Element handle; equality is element identity
    type Element: Clone + PartialEq + fmt::Debug + 'static;
    type Observer: ObservationHandle;

    /// Whether `element` itself matches `selector`
    fn matches(&self, element: &Self::Element, selector: &str) -> Result<bool>;

    /// First descendant of `root` matching `selector`, in document order
    fn query_selector(&self, root: &Self::Element, selector: &str)
        -> Result<Option<Self::Element>>;

    /// Classify `element` as a text-entry control
    fn text_control(&self, element: &Self::Element) -> Option<TextControl>;

    fn focus(&self, element: &Self::Element, request: FocusRequest);

    /// Whether `element` is still attached to the live document
    fn is_connected(&self, element: &Self::Element) -> bool;

    /// Current value of a text-entry control
    fn value(&self, element: &Self::Element) -> String;

    /// Select the whole value of a text-entry control
    fn select(&self, element: &Self::Element);

    fn set_selection_range(&self, element: &Self::Element, start: u32, end: u32);

    /// Watch `element` for viewport intersection changes
    fn observe(
        &self,
        element: &Self::Element,
        callback: VisibilityCallback<Self>,
    ) -> Result<Self::Observer>;

    /// Schedule `task` to run once the current render pass has settled
    fn after_render(&self, task: RenderTask<Self>);
}
