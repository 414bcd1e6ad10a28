//! `LocalQueue` - FIFO task queue implementing `Scheduler`.
//!
//! Tasks go into an unbounded crossbeam `SegQueue` and run only when the
//! owner drains the queue, so `schedule()` never runs anything inline.
//! Both executors embed one; on its own it drives async deliveries that
//! need no I/O (records already buffered).

use inwatch_core::executor::{Scheduler, Task};

use crossbeam_queue::SegQueue;

use std::cell::Cell;

#[derive(Default)]
pub struct LocalQueue {
    tasks: SegQueue<Task>,
    /// Total tasks run (diagnostics).
    ran: Cell<u64>,
}

impl LocalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the oldest task, if any.
    pub fn run_one(&self) -> bool {
        match self.tasks.pop() {
            Some(task) => {
                task();
                self.ran.set(self.ran.get() + 1);
                true
            }
            None => false,
        }
    }

    /// Run the tasks that were queued when the call began. Tasks they
    /// schedule wait for the next call.
    pub fn run_ready(&self) -> usize {
        let batch = self.tasks.len();
        let mut n = 0;
        while n < batch && self.run_one() {
            n += 1;
        }
        n
    }

    /// Run until the queue is empty, including newly scheduled tasks.
    pub fn run(&self) -> usize {
        let mut n = 0;
        while self.run_one() {
            n += 1;
        }
        n
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn total_ran(&self) -> u64 {
        self.ran.get()
    }
}

impl Scheduler for LocalQueue {
    fn schedule(&self, task: Task) {
        self.tasks.push(task);
    }
}
