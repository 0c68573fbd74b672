//! Headless Autofocus Demo
//!
//! Builds a page with a search bar and a sign-in dialog, attaches autofocus
//! to both, then scrolls them in and out of view:
//! - the search bar uses the default target and starts visible
//! - the dialog targets `#email` and opens later
//! - the dialog is closed and reopened to show refocusing
//!
//! Run with: RUST_LOG=autofocus=trace cargo run -p autofocus --example headless_form

use anyhow::{bail, Result};
use autofocus::{FocusConfig, FocusDirective};
use autofocus_dom::{NodeId, Page, SelectionRange};

struct Layout {
    search: NodeId,
    query: NodeId,
    dialog: NodeId,
    email: NodeId,
}

fn build(page: &Page) -> Layout {
    let mut doc = page.document_mut();
    let root = doc.root();

    let search = doc.create_element("header");
    let query = doc.create_element("input");
    doc.set_attribute(query, "type", "search");
    doc.set_value(query, "rust focus");
    doc.append_child(root, search);
    doc.append_child(search, query);

    let dialog = doc.create_element("dialog");
    let name = doc.create_element("input");
    let email = doc.create_element("input");
    doc.set_id(email, "email");
    doc.set_attribute(email, "type", "email");
    doc.append_child(root, dialog);
    doc.append_child(dialog, name);
    doc.append_child(dialog, email);

    Layout {
        search,
        query,
        dialog,
        email,
    }
}

fn describe(page: &Page, label: &str) {
    let doc = page.document();
    match doc.focused() {
        Some(node) => println!(
            "{label}: focused <{}> {:?} selection {:?}",
            doc.element(node).map(|e| e.tag_name()).unwrap_or("?"),
            doc.value(node),
            doc.selection(node),
        ),
        None => println!("{label}: nothing focused"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let page = Page::new();
    let layout = build(&page);
    let mut directive = FocusDirective::new(page.clone());

    page.set_intersecting(layout.search, true);
    directive.on_attach(layout.search, true);
    let dialog_config: FocusConfig = serde_json::from_str(r##"{ "target": "#email" }"##)?;
    directive.on_attach(layout.dialog, dialog_config);

    page.tick();
    describe(&page, "page loaded");
    if page.document().focused() != Some(layout.query) {
        bail!("search field should be focused after load");
    }

    page.set_intersecting(layout.dialog, true);
    page.tick();
    describe(&page, "dialog opened");

    page.document_mut().set_value(layout.email, "me@example.com");
    page.set_intersecting(layout.dialog, false);
    page.tick();
    page.set_intersecting(layout.dialog, true);
    page.tick();
    describe(&page, "dialog reopened");
    if page.document().focused() != Some(layout.email) {
        bail!("email field should be focused after reopening");
    }
    if page.document().selection(layout.email) != Some(SelectionRange::new(0, 14)) {
        bail!("email address should be selected after reopening");
    }

    directive.on_detach(&layout.dialog);
    directive.on_detach(&layout.search);
    println!("detached, {} observers left", page.observer_count());

    Ok(())
}
