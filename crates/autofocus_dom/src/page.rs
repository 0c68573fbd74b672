//! Page: document, intersection tracker and render queue behind one handle
//!
//! `Page` is a cheap-clone handle over shared, single-threaded state. None of
//! its cells stay borrowed while user code runs: intersection callbacks and
//! render tasks are taken out of their queues first, so they may query or
//! mutate the document, disconnect observers, or queue further work.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::document::{Document, NodeId};
use crate::intersection::{IntersectionEntry, IntersectionTracker, ObserverId};
use crate::render_queue::RenderQueue;

struct PageInner {
    document: RefCell<Document>,
    intersections: RefCell<IntersectionTracker<Page>>,
    render_queue: RefCell<RenderQueue<Page>>,
}

/// Shared handle to a headless page
#[derive(Clone)]
pub struct Page {
    inner: Rc<PageInner>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("document", &self.inner.document)
            .field("intersections", &self.inner.intersections)
            .field("render_queue", &self.inner.render_queue)
            .finish()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Page {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(PageInner {
                document: RefCell::new(Document::new()),
                intersections: RefCell::new(IntersectionTracker::new()),
                render_queue: RefCell::new(RenderQueue::new()),
            }),
        }
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.document.borrow_mut()
    }

    // =========================================================================
    // Intersection
    // =========================================================================

    pub fn observe<F>(&self, target: NodeId, callback: F) -> ObserverId
    where
        F: FnMut(&Page, &[IntersectionEntry]) + 'static,
    {
        self.inner.intersections.borrow_mut().observe(target, callback)
    }

    pub fn disconnect(&self, observer: ObserverId) -> bool {
        self.inner.intersections.borrow_mut().disconnect(observer)
    }

    pub fn is_observer_live(&self, observer: ObserverId) -> bool {
        self.inner.intersections.borrow().is_live(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.intersections.borrow().observer_count()
    }

    /// Number of live observers watching `target`
    pub fn observers_of(&self, target: NodeId) -> usize {
        self.inner.intersections.borrow().observers_of(target)
    }

    /// Report that `target` entered or left the viewport
    ///
    /// Nothing is delivered until [`Page::flush_intersections`].
    pub fn set_intersecting(&self, target: NodeId, intersecting: bool) {
        self.inner
            .intersections
            .borrow_mut()
            .set_intersecting(target, intersecting);
    }

    /// Queue a raw batch for one observer
    pub fn deliver(&self, observer: ObserverId, entries: &[IntersectionEntry]) -> bool {
        self.inner
            .intersections
            .borrow_mut()
            .deliver(observer, entries)
    }

    /// Deliver queued intersection batches; returns how many callbacks ran
    ///
    /// A batch whose observer was disconnected by an earlier callback in the
    /// same flush is dropped.
    pub fn flush_intersections(&self) -> usize {
        let batches = self.inner.intersections.borrow_mut().take_batches();
        let mut delivered = 0;

        for batch in batches {
            if !self.is_observer_live(batch.observer) {
                continue;
            }
            let Ok(mut callback) = batch.callback.try_borrow_mut() else {
                tracing::trace!("observer {:?} is already running, batch dropped", batch.observer);
                continue;
            };
            (&mut **callback)(self, batch.entries.as_slice());
            delivered += 1;
        }

        delivered
    }

    // =========================================================================
    // Render settle
    // =========================================================================

    /// Run `task` once pending UI updates have settled
    pub fn after_render<F>(&self, task: F)
    where
        F: FnOnce(&Page) + 'static,
    {
        self.inner.render_queue.borrow_mut().push(task);
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.render_queue.borrow().len()
    }

    /// Run queued render tasks until the queue is empty; returns how many ran
    pub fn settle(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.inner.render_queue.borrow_mut().pop();
            let Some(task) = task else {
                break;
            };
            task(self);
            ran += 1;
        }
        ran
    }

    /// Deliver intersections, then settle the render queue
    pub fn tick(&self) {
        let delivered = self.flush_intersections();
        let ran = self.settle();
        if delivered > 0 || ran > 0 {
            tracing::trace!("tick: {} batches, {} render tasks", delivered, ran);
        }
    }
}
