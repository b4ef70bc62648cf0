//! Deferred tasks and animation-frame callbacks on the virtual clock.

use crate::Page;
use anyhow::Result;
use serde::Serialize;

/// A deferred task. It owns whatever state it needs and may reschedule itself.
pub type Task = Box<dyn FnOnce(&mut Page) -> Result<()>>;

/// An animation-frame callback, given the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(&mut Page, f64) -> Result<()>>;

/// Handle returned by [`Page::set_timeout`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TimerId(pub u64);

/// Handle returned by [`Page::request_animation_frame`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FrameRequestId(pub u64);

/// Read-only view of a scheduled timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_at: u64,
    pub order: u64,
}

struct ScheduledTask {
    id: TimerId,
    due_at: u64,
    order: u64,
    task: Task,
}

/// Timers ordered by due time, ties broken by registration order.
#[derive(Default)]
pub struct TimerQueue {
    tasks: Vec<ScheduledTask>,
    next_id: u64,
    next_order: u64,
}

impl TimerQueue {
    pub fn schedule(&mut self, due_at: u64, task: Task) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let order = self.next_order;
        self.next_order += 1;
        self.tasks.push(ScheduledTask {
            id,
            due_at,
            order,
            task,
        });
        id
    }

    /// Cancel a timer; returns false if it already ran or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    fn next_index(&self, due_limit: Option<u64>) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    /// Due time of the earliest timer.
    pub fn next_due(&self) -> Option<u64> {
        self.next_index(None).map(|idx| self.tasks[idx].due_at)
    }

    /// Remove and return the earliest timer due at or before `limit`.
    pub fn pop_due(&mut self, limit: u64) -> Option<(TimerId, u64, Task)> {
        let idx = self.next_index(Some(limit))?;
        let task = self.tasks.remove(idx);
        Some((task.id, task.due_at, task.task))
    }

    pub fn pending(&self) -> Vec<PendingTimer> {
        let mut timers: Vec<PendingTimer> = self
            .tasks
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Callbacks waiting for the next animation frame.
#[derive(Default)]
pub struct FrameQueue {
    callbacks: Vec<(FrameRequestId, FrameCallback)>,
    next_id: u64,
}

impl FrameQueue {
    pub fn request(&mut self, callback: FrameCallback) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.callbacks.push((id, callback));
        id
    }

    pub fn cancel(&mut self, id: FrameRequestId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(pending, _)| *pending != id);
        self.callbacks.len() != before
    }

    /// Take every callback queued so far; callbacks queued while these run
    /// wait for the following frame.
    pub fn take_all(&mut self) -> Vec<(FrameRequestId, FrameCallback)> {
        std::mem::take(&mut self.callbacks)
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
