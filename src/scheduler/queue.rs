//! Dispatch queue: FIFO of tasks awaiting a worker pull.
//!
//! Not synchronized on its own; the scheduler owns it behind its lock.

use std::collections::VecDeque;

use super::task::Task;

#[derive(Debug, Default)]
pub struct DispatchQueue {
    tasks: VecDeque<Task>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append tasks to the tail, preserving their order.
    pub fn enqueue_many(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.extend(tasks);
    }

    /// Remove and return the head task, if any.
    pub fn dequeue_one(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
