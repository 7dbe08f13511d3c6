// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single-threaded deferred task queue.
//!
//! Label passes do not run inside `render`. They are posted to the host's event
//! queue and run later with the host's context (usually the painter). Producers
//! only ever post messages: a [`TaskSender`] posts "schedule" messages and a
//! [`CancelHandle`] posts "cancel" messages. The [`DeferredQueue`] is the single
//! consumer; it drains its inbox before it looks at the clock, so a cancel posted
//! before the queue runs always wins.
//!
//! Time is virtual. The host advances it (from a frame callback, a real timer, or a
//! test) with [`DeferredQueue::advance`].

extern crate alloc;

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::time::Duration;

/// Identifies one scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

type Task<C> = Box<dyn FnOnce(&mut C)>;

struct Scheduled<C> {
    id: TaskId,
    due: Duration,
    task: Task<C>,
}

struct Inbox<C> {
    clock: Cell<Duration>,
    next_id: Cell<u64>,
    scheduled: RefCell<VecDeque<Scheduled<C>>>,
}

type CancelBox = Rc<RefCell<Vec<TaskId>>>;

/// The consumer side: owns the timers and runs due tasks.
pub struct DeferredQueue<C> {
    inbox: Rc<Inbox<C>>,
    cancelled: CancelBox,
    timers: BTreeMap<(Duration, TaskId), Task<C>>,
}

impl<C> core::fmt::Debug for DeferredQueue<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("now", &self.inbox.clock.get())
            .field("timers", &self.timers.len())
            .field("inbox", &self.inbox.scheduled.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<C> Default for DeferredQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> DeferredQueue<C> {
    /// Creates an empty queue with its clock at zero.
    pub fn new() -> Self {
        Self {
            inbox: Rc::new(Inbox {
                clock: Cell::new(Duration::ZERO),
                next_id: Cell::new(0),
                scheduled: RefCell::new(VecDeque::new()),
            }),
            cancelled: Rc::default(),
            timers: BTreeMap::new(),
        }
    }

    /// Returns a producer handle for this queue.
    pub fn sender(&self) -> TaskSender<C> {
        TaskSender {
            inbox: self.inbox.clone(),
            cancelled: self.cancelled.clone(),
        }
    }

    /// The current virtual time.
    pub fn now(&self) -> Duration {
        self.inbox.clock.get()
    }

    /// Number of tasks that are scheduled and not cancelled.
    pub fn pending_count(&mut self) -> usize {
        self.drain_inbox();
        self.timers.len()
    }

    /// Returns `true` if `id` is scheduled and not cancelled.
    pub fn is_scheduled(&mut self, id: TaskId) -> bool {
        self.drain_inbox();
        self.timers.keys().any(|&(_, task)| task == id)
    }

    /// Runs every task that is due now. Returns how many ran.
    pub fn run_ready(&mut self, ctx: &mut C) -> usize {
        self.run_until(self.now(), ctx)
    }

    /// Moves the clock forward by `by`, running tasks in due order as their time
    /// comes. Returns how many ran.
    pub fn advance(&mut self, by: Duration, ctx: &mut C) -> usize {
        let target = self.now().saturating_add(by);
        let ran = self.run_until(target, ctx);
        self.inbox.clock.set(target);
        ran
    }

    fn run_until(&mut self, target: Duration, ctx: &mut C) -> usize {
        let mut ran = 0;
        loop {
            // Tasks may schedule or cancel, so the inbox is drained before every pick.
            self.drain_inbox();
            let Some(entry) = self.timers.first_entry() else {
                break;
            };
            let (due, id) = *entry.key();
            if due > target {
                break;
            }
            let task = entry.remove();
            if due > self.now() {
                self.inbox.clock.set(due);
            }
            tracing::trace!(task = id.0, "running deferred task");
            task(ctx);
            ran += 1;
        }
        ran
    }

    fn drain_inbox(&mut self) {
        let scheduled: Vec<_> = self.inbox.scheduled.borrow_mut().drain(..).collect();
        for Scheduled { id, due, task } in scheduled {
            self.timers.insert((due, id), task);
        }
        let cancelled = core::mem::take(&mut *self.cancelled.borrow_mut());
        if !cancelled.is_empty() {
            self.timers.retain(|(_, id), _| !cancelled.contains(id));
        }
    }
}

/// The producer side of a [`DeferredQueue`]. Cheap to clone.
pub struct TaskSender<C> {
    inbox: Rc<Inbox<C>>,
    cancelled: CancelBox,
}

impl<C> Clone for TaskSender<C> {
    fn clone(&self) -> Self {
        Self {
            inbox: self.inbox.clone(),
            cancelled: self.cancelled.clone(),
        }
    }
}

impl<C> core::fmt::Debug for TaskSender<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TaskSender")
            .field("now", &self.inbox.clock.get())
            .finish_non_exhaustive()
    }
}

impl<C> TaskSender<C> {
    /// Posts `task` to run `delay` after the queue's current time.
    ///
    /// Tasks due at the same time run in the order they were posted.
    pub fn schedule(&self, delay: Duration, task: impl FnOnce(&mut C) + 'static) -> CancelHandle {
        let id = TaskId(self.inbox.next_id.get());
        self.inbox.next_id.set(id.0 + 1);
        let due = self.inbox.clock.get().saturating_add(delay);
        self.inbox.scheduled.borrow_mut().push_back(Scheduled {
            id,
            due,
            task: Box::new(task),
        });
        CancelHandle {
            id,
            cancelled: self.cancelled.clone(),
        }
    }
}

/// Cancels one scheduled task.
#[derive(Clone)]
pub struct CancelHandle {
    id: TaskId,
    cancelled: CancelBox,
}

impl core::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl CancelHandle {
    /// The task this handle cancels.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Cancels the task if it has not run yet.
    ///
    /// Calling this more than once, or after the task ran, does nothing.
    pub fn cancel(&self) {
        let mut cancelled = self.cancelled.borrow_mut();
        if !cancelled.contains(&self.id) {
            cancelled.push(self.id);
        }
    }
}
