//! Attach/detach lifecycle for host frameworks
//!
//! [`FocusDirective`] is the entry point a host calls from its mount and
//! unmount hooks. It keeps a side-table from host element to the watcher that
//! owns its observation handle, so the host never has to store anything on
//! the element itself.
//!
//! # Example
//!
//! ```rust
//! use autofocus::{FocusDirective, PartialFocusOptions};
//! use autofocus_dom::Page;
//!
//! let page = Page::new();
//! let dialog = {
//!     let mut doc = page.document_mut();
//!     let root = doc.root();
//!     let dialog = doc.create_element("dialog");
//!     doc.append_child(root, dialog);
//!     dialog
//! };
//!
//! let mut directive = FocusDirective::new(page.clone());
//! directive.on_attach(dialog, PartialFocusOptions::default().target("#search"));
//! assert!(directive.is_attached(&dialog));
//!
//! directive.on_detach(&dialog);
//! directive.on_detach(&dialog);
//! assert_eq!(page.observer_count(), 0);
//! ```

use std::fmt;

use crate::options::FocusConfig;
use crate::platform::Platform;
use crate::watcher::VisibilityWatcher;

/// Lifecycle manager holding at most one watcher per host element
pub struct FocusDirective<P: Platform> {
    platform: P,
    /// Active watchers; inert attachments are not stored
    attachments: Vec<VisibilityWatcher<P>>,
}

impl<P: Platform + fmt::Debug> fmt::Debug for FocusDirective<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusDirective")
            .field("platform", &self.platform)
            .field("attachments", &self.attachments)
            .finish()
    }
}

impl<P: Platform> FocusDirective<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            attachments: Vec::new(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Host element entered the live document
    ///
    /// Re-attaching a host that is already watched releases the previous
    /// handle first.
    pub fn on_attach(&mut self, host: P::Element, config: impl Into<FocusConfig>) {
        if self.release(&host) {
            tracing::debug!("autofocus re-attached to {:?}; previous watcher released", host);
        }

        let watcher = VisibilityWatcher::attach(&self.platform, host, config);
        if watcher.is_watching() {
            self.attachments.push(watcher);
        }
    }

    /// Host element left the live document
    ///
    /// Always safe: detaching an unknown or already-detached host does nothing.
    pub fn on_detach(&mut self, host: &P::Element) {
        if !self.release(host) {
            tracing::trace!("autofocus detach for {:?}: nothing attached", host);
        }
    }

    /// Whether `host` currently has a live watcher
    pub fn is_attached(&self, host: &P::Element) -> bool {
        self.attachments.iter().any(|w| w.host() == host)
    }

    /// The watcher for `host`, if attached
    pub fn watcher(&self, host: &P::Element) -> Option<&VisibilityWatcher<P>> {
        self.attachments.iter().find(|w| w.host() == host)
    }

    /// Number of attached hosts
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Detach every host
    pub fn clear(&mut self) {
        for mut watcher in self.attachments.drain(..) {
            watcher.detach();
        }
    }

    fn release(&mut self, host: &P::Element) -> bool {
        let Some(index) = self.attachments.iter().position(|w| w.host() == host) else {
            return false;
        };
        let mut watcher = self.attachments.swap_remove(index);
        watcher.detach();
        true
    }
}
