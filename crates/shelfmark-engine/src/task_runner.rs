//! Sequential task queue on which every asynchronous result is delivered.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Cloneable handle to one FIFO queue of deferred tasks.
///
/// Posting never runs anything; tasks only run from [`TaskRunner::run_until_idle`],
/// so a callback is never invoked inside the call that scheduled it.
#[derive(Clone, Default)]
pub struct TaskRunner {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Run tasks until the queue is empty, including tasks posted by tasks.
    ///
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // The queue borrow must end before the task runs so it can post
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            log::debug!("task runner drained {ran} task(s)");
        }
        ran
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_post_does_not_run_immediately() {
        let runner = TaskRunner::new();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        runner.post(move || flag.set(true));

        assert!(!ran.get());
        assert_eq!(runner.pending(), 1);
        assert_eq!(runner.run_until_idle(), 1);
        assert!(ran.get());
        assert_eq!(runner.pending(), 0);
    }

    #[test]
    fn test_tasks_run_in_order_including_nested_posts() {
        let runner = TaskRunner::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let nested_runner = runner.clone();
        let o = order.clone();
        runner.post(move || {
            o.borrow_mut().push(1);
            let o2 = o.clone();
            nested_runner.post(move || o2.borrow_mut().push(3));
        });
        let o = order.clone();
        runner.post(move || o.borrow_mut().push(2));

        assert_eq!(runner.run_until_idle(), 3);
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }
}
