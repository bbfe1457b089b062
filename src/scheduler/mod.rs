//! Scheduler - run-once idle callbacks on a cooperative, single-threaded loop.
//!
//! A host toolkit normally provides "run this after the current event". Without
//! one, [`IdleQueue`] is an explicit task queue the host drains once per outer
//! loop iteration.
//!
//! ## Example
//!
//! ```
//! use preset_registry::{IdleQueue, Scheduler};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let queue = IdleQueue::new();
//! let fired = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&fired);
//! queue.schedule_idle(Box::new(move || counter.set(counter.get() + 1)));
//!
//! assert_eq!(fired.get(), 0);
//! assert_eq!(queue.run_pending(), 1);
//! assert_eq!(fired.get(), 1);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

pub type IdleTask = Box<dyn FnOnce()>;

/// Host capability: run `task` once, after the current synchronous work and
/// before the next externally dispatched event.
pub trait Scheduler {
    fn schedule_idle(&self, task: IdleTask);
}

/// FIFO of idle tasks. Clones share the same queue.
#[derive(Clone, Default)]
pub struct IdleQueue {
    tasks: Rc<RefCell<VecDeque<IdleTask>>>,
}

impl IdleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// One loop iteration: run the tasks queued so far and return how many ran.
    ///
    /// Tasks scheduled while this batch runs wait for the next call.
    pub fn run_pending(&self) -> usize {
        let batch = std::mem::take(&mut *self.tasks.borrow_mut());
        let ran = batch.len();
        for task in batch {
            task();
        }
        if ran > 0 {
            trace!(ran, "idle tasks ran");
        }
        ran
    }

    /// Iterate until no task is left or `max_iterations` is reached. Returns the tasks run.
    pub fn run_until_idle(&self, max_iterations: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_iterations {
            if self.is_idle() {
                break;
            }
            total += self.run_pending();
        }
        total
    }
}

impl Scheduler for IdleQueue {
    fn schedule_idle(&self, task: IdleTask) {
        self.tasks.borrow_mut().push_back(task);
    }
}
