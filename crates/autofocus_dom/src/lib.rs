//! Autofocus headless document engine
//!
//! This crate provides the platform primitives the focus behavior needs,
//! implemented without a browser:
//!
//! - **Document**: element tree with attributes, values, focus and text selection
//! - **Selectors**: CSS selector list parsing and right-to-left matching
//! - **Intersection**: viewport-intersection observers with batched delivery
//! - **Render queue**: continuations that run once pending UI updates settle
//! - **Page**: a cheap-clone handle tying the pieces together
//!
//! # Example
//!
//! ```rust
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
//!     (form, input)
//! };
//!
//! assert_eq!(page.document().query_selector(form, "input, textarea"), Ok(Some(input)));
//! ```

pub mod document;
pub mod intersection;
pub mod page;
pub mod render_queue;
pub mod selector;

pub use document::{Document, Element, FocusRecord, NodeId, SelectionRange};
pub use intersection::{IntersectionEntry, IntersectionTracker, ObserverId};
pub use page::Page;
pub use render_queue::RenderQueue;
pub use selector::{SelectorError, SelectorList};
