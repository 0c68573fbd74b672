//! Visibility watcher
//!
//! One watcher per attachment. It owns the observation handle for its host
//! and releases it on [`VisibilityWatcher::detach`] or when dropped.
//!
//! # Lifecycle
//!
//! ```text
//! attach ──► watching ──(enters view)──► focus target ──┐
//!   │           ▲                                      │
//!   │           └──────────────────────────────────────┘
//!   │ (disabled / empty target: inert, nothing held)
//!   ▼
//! detach ──► detached (terminal)
//! ```
//!
//! The watcher keeps observing after a trigger: every re-entry into the
//! viewport refocuses the target.

use std::fmt;

use crate::actuator::focus_target;
use crate::locator::find_target;
use crate::options::{FocusConfig, FocusOptions};
use crate::platform::{ObservationHandle, Platform, VisibilityCallback, VisibilityEntry};

pub struct VisibilityWatcher<P: Platform> {
    host: P::Element,
    options: FocusOptions,
    observer: Option<P::Observer>,
}

impl<P: Platform> fmt::Debug for VisibilityWatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityWatcher")
            .field("host", &self.host)
            .field("options", &self.options)
            .field("watching", &self.is_watching())
            .finish()
    }
}

impl<P: Platform> VisibilityWatcher<P> {
    /// Resolve `config` and start watching `host`
    ///
    /// When the resolved options are disabled or have an empty target, or
    /// the platform cannot observe the host, the returned watcher is inert.
    pub fn attach(platform: &P, host: P::Element, config: impl Into<FocusConfig>) -> Self {
        let options = config.into().resolve();
        let mut watcher = Self {
            host,
            options,
            observer: None,
        };

        if !watcher.options.is_active() {
            tracing::debug!(
                "autofocus inert for {:?} (enabled: {}, target: {:?})",
                watcher.host,
                watcher.options.enabled,
                watcher.options.target
            );
            return watcher;
        }

        let host = watcher.host.clone();
        let selector = watcher.options.target.clone();
        let callback: VisibilityCallback<P> = Box::new(
            move |platform: &P, entries: &[VisibilityEntry<P::Element>]| {
                for entry in entries.iter().filter(|entry| entry.is_intersecting) {
                    tracing::trace!(
                        "{:?} entered view (ratio {:.2})",
                        host,
                        entry.intersection_ratio
                    );
                    if let Some(target) = find_target(platform, &host, &selector) {
                        focus_target(platform, &target);
                    }
                }
            },
        );

        match platform.observe(&watcher.host, callback) {
            Ok(observer) => {
                tracing::debug!(
                    "autofocus watching {:?} for `{}`",
                    watcher.host,
                    watcher.options.target
                );
                watcher.observer = Some(observer);
            }
            Err(err) => tracing::debug!("autofocus inert for {:?}: {}", watcher.host, err),
        }
        watcher
    }

    pub fn host(&self) -> &P::Element {
        &self.host
    }

    pub fn options(&self) -> &FocusOptions {
        &self.options
    }

    /// The observation handle, when one is held
    pub fn observer(&self) -> Option<&P::Observer> {
        self.observer.as_ref()
    }

    /// Whether an observation handle is held
    pub fn is_watching(&self) -> bool {
        self.observer.is_some()
    }

    /// Release the observation handle; safe to call when none is held
    pub fn detach(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
            tracing::debug!("autofocus detached from {:?}", self.host);
        }
    }
}

impl<P: Platform> Drop for VisibilityWatcher<P> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::PartialFocusOptions;
    use autofocus_dom::{IntersectionEntry, NodeId, Page};

    fn form_with_input(page: &Page) -> (NodeId, NodeId) {
        let mut doc = page.document_mut();
        let root = doc.root();
        let form = doc.create_element("form");
        let input = doc.create_element("input");
        doc.append_child(root, form);
        doc.append_child(form, input);
        (form, input)
    }

    #[test]
    fn test_attach_watches() {
        let page = Page::new();
        let (form, _) = form_with_input(&page);

        let watcher = VisibilityWatcher::attach(&page, form, true);
        assert!(watcher.is_watching());
        assert_eq!(watcher.host(), &form);
        assert_eq!(page.observers_of(form), 1);
    }

    #[test]
    fn test_inert_configurations() {
        let page = Page::new();
        let (form, _) = form_with_input(&page);

        let disabled = VisibilityWatcher::attach(&page, form, false);
        let empty = VisibilityWatcher::attach(&page, form, PartialFocusOptions::default().target(""));
        assert!(!disabled.is_watching());
        assert!(!empty.is_watching());
        assert_eq!(page.observer_count(), 0);
    }

    #[test]
    fn test_unknown_host_is_inert() {
        let page = Page::new();
        let stale = Page::new().document_mut().create_element("form");
        let watcher = VisibilityWatcher::attach(&page, stale, true);
        assert!(!watcher.is_watching());
    }

    #[test]
    fn test_leaving_view_is_ignored() {
        let page = Page::new();
        let (form, _) = form_with_input(&page);
        let _watcher = VisibilityWatcher::attach(&page, form, true);

        page.set_intersecting(form, false);
        page.tick();
        assert!(page.document().focus_log().is_empty());
    }

    #[test]
    fn test_every_entering_entry_in_batch_triggers() {
        let page = Page::new();
        let (form, input) = form_with_input(&page);
        let watcher = VisibilityWatcher::attach(&page, form, true);
        let observer = watcher.observer().map(|o| o.id()).unwrap();

        page.deliver(
            observer,
            &[
                IntersectionEntry::new(form, true),
                IntersectionEntry::new(form, false),
                IntersectionEntry::new(form, true),
            ],
        );
        page.flush_intersections();

        let log = page.document().focus_log().to_vec();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|record| record.node == input));
        assert_eq!(page.pending_tasks(), 2);
    }

    #[test]
    fn test_detach_and_drop_release_handle() {
        let page = Page::new();
        let (form, _) = form_with_input(&page);

        let mut watcher = VisibilityWatcher::attach(&page, form, true);
        watcher.detach();
        watcher.detach();
        assert!(!watcher.is_watching());
        assert_eq!(page.observer_count(), 0);

        {
            let _scoped = VisibilityWatcher::attach(&page, form, true);
            assert_eq!(page.observer_count(), 1);
        }
        assert_eq!(page.observer_count(), 0);
    }

    #[test]
    fn test_target_located_on_each_trigger() {
        let page = Page::new();
        let (form, first) = form_with_input(&page);
        let _watcher = VisibilityWatcher::attach(&page, form, true);

        page.set_intersecting(form, true);
        page.tick();
        assert_eq!(page.document().focused(), Some(first));

        let second = {
            let mut doc = page.document_mut();
            doc.remove(first);
            let area = doc.create_element("textarea");
            doc.append_child(form, area);
            area
        };
        page.set_intersecting(form, false);
        page.set_intersecting(form, true);
        page.tick();
        assert_eq!(page.document().focused(), Some(second));
    }
}
