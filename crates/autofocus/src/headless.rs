//! [`Platform`] binding for the headless [`Page`]
//!
//! Visibility is driven with [`Page::set_intersecting`] and delivered by
//! [`Page::flush_intersections`]; deferred selection runs on [`Page::settle`].

use autofocus_dom::{NodeId, ObserverId, Page};
use smallvec::SmallVec;

use crate::error::{FocusError, Result};
use crate::platform::{
    FocusRequest, ObservationHandle, Platform, RenderTask, TextControl, VisibilityCallback,
    VisibilityEntry,
};

/// Observation handle for one headless intersection observer
#[derive(Debug)]
pub struct HeadlessObserver {
    page: Page,
    id: ObserverId,
}

impl HeadlessObserver {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn is_connected(&self) -> bool {
        self.page.is_observer_live(self.id)
    }
}

impl ObservationHandle for HeadlessObserver {
    fn disconnect(&mut self) {
        self.page.disconnect(self.id);
    }
}

impl Platform for Page {
    type Element = NodeId;
    type Observer = HeadlessObserver;

    fn matches(&self, element: &NodeId, selector: &str) -> Result<bool> {
        Ok(self.document().matches(*element, selector)?)
    }

    fn query_selector(&self, root: &NodeId, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.document().query_selector(*root, selector)?)
    }

    fn text_control(&self, element: &NodeId) -> Option<TextControl> {
        let doc = self.document();
        match doc.element(*element)?.tag_name() {
            "input" => Some(TextControl::Input),
            "textarea" => Some(TextControl::TextArea),
            _ => None,
        }
    }

    fn focus(&self, element: &NodeId, request: FocusRequest) {
        self.document_mut().focus(*element, request.prevent_scroll);
    }

    fn is_connected(&self, element: &NodeId) -> bool {
        self.document().is_connected(*element)
    }

    fn value(&self, element: &NodeId) -> String {
        self.document().value(*element).to_string()
    }

    fn select(&self, element: &NodeId) {
        self.document_mut().select(*element);
    }

    fn set_selection_range(&self, element: &NodeId, start: u32, end: u32) {
        self.document_mut()
            .set_selection_range(*element, start as usize, end as usize);
    }

    fn observe(
        &self,
        element: &NodeId,
        mut callback: VisibilityCallback<Self>,
    ) -> Result<HeadlessObserver> {
        if !self.document().contains(*element) {
            return Err(FocusError::Observe(format!(
                "{:?} does not belong to this page",
                element
            )));
        }

        let id = Page::observe(self, *element, move |page, entries| {
            let entries: SmallVec<[VisibilityEntry<NodeId>; 4]> = entries
                .iter()
                .map(|entry| VisibilityEntry {
                    target: entry.target,
                    is_intersecting: entry.is_intersecting,
                    intersection_ratio: entry.intersection_ratio,
                })
                .collect();
            callback(page, entries.as_slice());
        });

        Ok(HeadlessObserver {
            page: self.clone(),
            id,
        })
    }

    fn after_render(&self, task: RenderTask<Self>) {
        Page::after_render(self, task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_control_classification() {
        let page = Page::new();
        let (input, area, div, checkbox) = {
            let mut doc = page.document_mut();
            let checkbox = doc.create_element("input");
            doc.set_attribute(checkbox, "type", "checkbox");
            (
                doc.create_element("input"),
                doc.create_element("textarea"),
                doc.create_element("div"),
                checkbox,
            )
        };

        assert_eq!(page.text_control(&input), Some(TextControl::Input));
        assert_eq!(page.text_control(&area), Some(TextControl::TextArea));
        assert_eq!(page.text_control(&div), None);
        assert_eq!(page.text_control(&checkbox), Some(TextControl::Input));
    }

    #[test]
    fn test_invalid_selector_maps_to_focus_error() {
        let page = Page::new();
        let root = page.document().root();
        let err = Platform::query_selector(&page, &root, "a[").unwrap_err();
        assert!(matches!(err, FocusError::InvalidSelector { .. }));
    }

    #[test]
    fn test_observer_handle_disconnects() {
        let page = Page::new();
        let root = page.document().root();
        let callback: VisibilityCallback<Page> = Box::new(|_: &Page, _: &[VisibilityEntry<NodeId>]| {});
        let mut handle = Platform::observe(&page, &root, callback).unwrap();
        assert!(handle.is_connected());

        handle.disconnect();
        handle.disconnect();
        assert!(!handle.is_connected());
        assert_eq!(page.observer_count(), 0);
    }

    #[test]
    fn test_after_render_runs_on_settle() {
        let page = Page::new();
        let root = page.document().root();
        let input = page.document_mut().create_element("input");
        page.document_mut().append_child(root, input);

        Platform::after_render(
            &page,
            Box::new(move |page: &Page| page.document_mut().set_value(input, "later")),
        );
        assert_eq!(page.document().value(input), "");
        page.settle();
        assert_eq!(page.document().value(input), "later");
    }
}
