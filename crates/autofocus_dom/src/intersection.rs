//! Viewport intersection tracking
//!
//! Observers are bound to one target element each. Visibility changes are
//! queued per observer and handed out as batches; the owner of the tracker
//! decides when to deliver them (see [`crate::Page::flush_intersections`]).
//!
//! The tracker is generic over the context `C` passed to callbacks, so the
//! callback can reach the rest of the page without capturing it.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::document::NodeId;

new_key_type! {
    /// Unique identifier for an intersection observer
    pub struct ObserverId;
}

/// One visibility notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub is_intersecting: bool,
    /// Visible fraction of the target, 0.0..=1.0
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    pub fn new(target: NodeId, is_intersecting: bool) -> Self {
        Self {
            target,
            is_intersecting,
            intersection_ratio: if is_intersecting { 1.0 } else { 0.0 },
        }
    }
}

/// Shared so a batch can run its callback after the tracker borrow is released
pub type IntersectionCallback<C> = Rc<RefCell<Box<dyn FnMut(&C, &[IntersectionEntry])>>>;

/// A batch of entries ready for delivery to one observer
pub struct PendingBatch<C> {
    pub observer: ObserverId,
    pub callback: IntersectionCallback<C>,
    pub entries: SmallVec<[IntersectionEntry; 4]>,
}

struct ObserverSlot<C> {
    target: NodeId,
    callback: IntersectionCallback<C>,
    pending: SmallVec<[IntersectionEntry; 4]>,
}

/// Registry of intersection observers and the last known visibility of each element
pub struct IntersectionTracker<C> {
    observers: SlotMap<ObserverId, ObserverSlot<C>>,
    visibility: FxHashMap<NodeId, bool>,
}

impl<C> std::fmt::Debug for IntersectionTracker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntersectionTracker")
            .field("observers", &self.observers.len())
            .field("visibility", &self.visibility)
            .finish()
    }
}

impl<C> Default for IntersectionTracker<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> IntersectionTracker<C> {
    pub fn new() -> Self {
        Self {
            observers: SlotMap::with_key(),
            visibility: FxHashMap::default(),
        }
    }

    /// Start observing `target`
    ///
    /// As with browser observers, an initial entry is queued when the
    /// target's visibility is already known.
    pub fn observe<F>(&mut self, target: NodeId, callback: F) -> ObserverId
    where
        F: FnMut(&C, &[IntersectionEntry]) + 'static,
    {
        let mut pending = SmallVec::new();
        if let Some(&visible) = self.visibility.get(&target) {
            pending.push(IntersectionEntry::new(target, visible));
        }
        let callback: Box<dyn FnMut(&C, &[IntersectionEntry])> = Box::new(callback);
        let id = self.observers.insert(ObserverSlot {
            target,
            callback: Rc::new(RefCell::new(callback)),
            pending,
        });
        tracing::trace!("observer {:?} watching {:?}", id, target);
        id
    }

    /// Stop an observer and drop its undelivered entries
    ///
    /// Returns false when the observer was already gone.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let removed = self.observers.remove(id).is_some();
        if removed {
            tracing::trace!("observer {:?} disconnected", id);
        }
        removed
    }

    pub fn is_live(&self, id: ObserverId) -> bool {
        self.observers.contains_key(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Number of live observers bound to `target`
    pub fn observers_of(&self, target: NodeId) -> usize {
        self.observers
            .values()
            .filter(|slot| slot.target == target)
            .count()
    }

    /// Last reported visibility of `target`
    pub fn is_intersecting(&self, target: NodeId) -> Option<bool> {
        self.visibility.get(&target).copied()
    }

    /// Record the visibility of `target`, queueing entries for its observers on change
    pub fn set_intersecting(&mut self, target: NodeId, intersecting: bool) {
        if self.visibility.insert(target, intersecting) == Some(intersecting) {
            return;
        }
        let entry = IntersectionEntry::new(target, intersecting);
        for slot in self.observers.values_mut() {
            if slot.target == target {
                slot.pending.push(entry);
            }
        }
    }

    /// Queue raw entries for one observer, bypassing change detection
    pub fn deliver(&mut self, id: ObserverId, entries: &[IntersectionEntry]) -> bool {
        match self.observers.get_mut(id) {
            Some(slot) => {
                slot.pending.extend_from_slice(entries);
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.observers.values().any(|slot| !slot.pending.is_empty())
    }

    /// Drain queued entries, one batch per observer
    pub fn take_batches(&mut self) -> Vec<PendingBatch<C>> {
        self.observers
            .iter_mut()
            .filter(|(_, slot)| !slot.pending.is_empty())
            .map(|(id, slot)| PendingBatch {
                observer: id,
                callback: Rc::clone(&slot.callback),
                entries: std::mem::take(&mut slot.pending),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn targets() -> (NodeId, NodeId) {
        let mut doc = Document::new();
        (doc.create_element("div"), doc.create_element("div"))
    }

    #[test]
    fn test_change_detection() {
        let (a, _) = targets();
        let mut tracker: IntersectionTracker<()> = IntersectionTracker::new();
        tracker.observe(a, |_, _| {});

        tracker.set_intersecting(a, true);
        tracker.set_intersecting(a, true);
        tracker.set_intersecting(a, false);

        let batches = tracker.take_batches();
        assert_eq!(batches.len(), 1);
        let flags: Vec<bool> = batches[0].entries.iter().map(|e| e.is_intersecting).collect();
        assert_eq!(flags, vec![true, false]);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn test_initial_entry_when_visibility_known() {
        let (a, b) = targets();
        let mut tracker: IntersectionTracker<()> = IntersectionTracker::new();
        tracker.set_intersecting(a, true);

        tracker.observe(a, |_, _| {});
        tracker.observe(b, |_, _| {});

        let batches = tracker.take_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].entries[0], IntersectionEntry::new(a, true));
    }

    #[test]
    fn test_entries_routed_by_target() {
        let (a, b) = targets();
        let mut tracker: IntersectionTracker<()> = IntersectionTracker::new();
        let obs_a = tracker.observe(a, |_, _| {});
        let _obs_b = tracker.observe(b, |_, _| {});

        tracker.set_intersecting(a, true);
        let batches = tracker.take_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].observer, obs_a);
        assert_eq!(tracker.observers_of(a), 1);
    }

    #[test]
    fn test_disconnect_drops_pending() {
        let (a, _) = targets();
        let mut tracker: IntersectionTracker<()> = IntersectionTracker::new();
        let id = tracker.observe(a, |_, _| {});
        tracker.set_intersecting(a, true);

        assert!(tracker.disconnect(id));
        assert!(!tracker.disconnect(id));
        assert!(!tracker.has_pending());
        assert!(!tracker.deliver(id, &[IntersectionEntry::new(a, true)]));
        assert_eq!(tracker.observer_count(), 0);
    }

    #[test]
    fn test_deliver_raw_batch() {
        let (a, _) = targets();
        let mut tracker: IntersectionTracker<()> = IntersectionTracker::new();
        let id = tracker.observe(a, |_, _| {});
        let entries = [IntersectionEntry::new(a, true), IntersectionEntry::new(a, true)];

        assert!(tracker.deliver(id, &entries));
        assert_eq!(tracker.take_batches()[0].entries.len(), 2);
    }
}
