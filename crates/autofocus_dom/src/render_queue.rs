//! Render-settle continuations
//!
//! Work queued here runs after the current batch of UI updates has been
//! applied, in FIFO order. Like the intersection tracker, tasks receive the
//! owning context by reference instead of capturing it.

use std::collections::VecDeque;

type Task<C> = Box<dyn FnOnce(&C)>;

/// FIFO of deferred continuations
pub struct RenderQueue<C> {
    tasks: VecDeque<Task<C>>,
}

impl<C> std::fmt::Debug for RenderQueue<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderQueue")
            .field("pending", &self.tasks.len())
            .finish()
    }
}

impl<C> Default for RenderQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> RenderQueue<C> {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    pub fn push<F>(&mut self, task: F)
    where
        F: FnOnce(&C) + 'static,
    {
        self.tasks.push_back(Box::new(task));
    }

    /// Next task to run, if any
    pub fn pop(&mut self) -> Option<Box<dyn FnOnce(&C)>> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
