//! Focus transfer and text selection

use crate::platform::{FocusRequest, Platform, TextControl};

/// Focus `target` and normalize its text selection
///
/// Text-entry controls are focused without scrolling, then their selection
/// is adjusted after the next render: the whole value is selected, or the
/// caret is placed at the end when the value is empty. Any other element is
/// simply focused.
pub fn focus_target<P: Platform>(platform: &P, target: &P::Element) {
    let Some(control) = platform.text_control(target) else {
        platform.focus(target, FocusRequest::default());
        return;
    };

    platform.focus(target, FocusRequest::without_scroll());

    // Focus handlers may rewrite the value; select against the settled state
    let target = target.clone();
    platform.after_render(Box::new(move |platform: &P| {
        settle_selection(platform, &target, control);
    }));
}

fn settle_selection<P: Platform>(platform: &P, target: &P::Element, control: TextControl) {
    if !platform.is_connected(target) {
        tracing::trace!("{:?} {:?} detached before selection", control, target);
        return;
    }

    let value = platform.value(target);
    if value.is_empty() {
        // Caret at the end of an empty value is offset 0
        platform.set_selection_range(target, 0, 0);
    } else {
        platform.select(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofocus_dom::{NodeId, Page, SelectionRange};

    fn attached(page: &Page, tag: &str) -> NodeId {
        let mut doc = page.document_mut();
        let root = doc.root();
        let node = doc.create_element(tag);
        doc.append_child(root, node);
        node
    }

    #[test]
    fn test_selects_after_settle() {
        let page = Page::new();
        let input = attached(&page, "input");
        page.document_mut().set_value(input, "hello");

        focus_target(&page, &input);
        assert_eq!(page.document().focused(), Some(input));
        assert_eq!(page.document().selection(input), None);
        assert_eq!(page.pending_tasks(), 1);

        page.settle();
        assert_eq!(page.document().selection(input), Some(SelectionRange::new(0, 5)));
    }

    #[test]
    fn test_selection_sees_value_changed_after_focus() {
        let page = Page::new();
        let area = attached(&page, "textarea");

        focus_target(&page, &area);
        page.document_mut().set_value(area, "draft");
        page.settle();

        assert_eq!(page.document().selection(area), Some(SelectionRange::new(0, 5)));
    }

    #[test]
    fn test_empty_value_collapses_caret() {
        let page = Page::new();
        let area = attached(&page, "textarea");

        focus_target(&page, &area);
        page.settle();
        assert_eq!(page.document().selection(area), Some(SelectionRange::caret(0)));
    }

    #[test]
    fn test_text_control_focus_does_not_scroll() {
        let page = Page::new();
        let input = attached(&page, "input");

        focus_target(&page, &input);
        let doc = page.document();
        assert_eq!(doc.scroll_target(), None);
        assert!(doc.focus_log()[0].prevent_scroll);
    }

    #[test]
    fn test_content_editable_plain_focus() {
        let page = Page::new();
        let div = attached(&page, "div");
        page.document_mut().set_content_editable(div, true);

        focus_target(&page, &div);
        assert_eq!(page.document().focused(), Some(div));
        assert_eq!(page.pending_tasks(), 0);
        assert!(!page.document().focus_log()[0].prevent_scroll);
    }

    #[test]
    fn test_removed_before_settle_is_noop() {
        let page = Page::new();
        let input = attached(&page, "input");
        page.document_mut().set_value(input, "hello");

        focus_target(&page, &input);
        page.document_mut().remove(input);
        assert_eq!(page.settle(), 1);
        assert_eq!(page.document().selection(input), None);
    }
}
