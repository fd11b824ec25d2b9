//! Fixed-size worker pool used by every phase that talks to the remote store.
//!
//! ## Protocol
//!
//! 1. Every item is enqueued on a bounded work queue, then the queue is closed.
//! 2. `min(workers, items)` scoped OS threads drain the queue; each item yields
//!    exactly one [`Outcome`] on the result queue.
//! 3. The scope joins every worker before the result queue is read, so the
//!    caller sees a complete phase or nothing.
//!
//! A failing job never cancels the others; the pool does not abort early.

use std::thread;

use crossbeam::channel;

/// The result of one job, paired with the item that produced it.
#[derive(Debug)]
pub struct Outcome<T, R, E> {
    pub item: T,
    pub result: Result<R, E>,
}

/// A bounded pool of blocking workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job` over every item and block until all workers have exited.
    ///
    /// Outcomes arrive in completion order, not item order.
    pub fn run<T, R, E, F>(&self, items: Vec<T>, job: F) -> Vec<Outcome<T, R, E>>
    where
        T: Send,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync,
    {
        if items.is_empty() {
            return Vec::new();
        }
        let jobs = items.len();
        let workers = self.workers.min(jobs);

        let (work_tx, work_rx) = channel::bounded::<T>(jobs);
        let (result_tx, result_rx) = channel::bounded::<Outcome<T, R, E>>(jobs);

        for item in items {
            // Capacity equals the item count and the receiver is alive.
            let _ = work_tx.send(item);
        }
        drop(work_tx);

        let job = &job;
        thread::scope(|scope| {
            for worker in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    let mut handled = 0usize;
                    for item in work_rx.iter() {
                        let result = job(&item);
                        handled += 1;
                        if result_tx.send(Outcome { item, result }).is_err() {
                            break;
                        }
                    }
                    tracing::trace!(worker, handled, "worker exited");
                });
            }
        });
        drop(result_tx);

        result_rx.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn empty_input_spawns_nothing() {
        let outcomes: Vec<Outcome<u32, u32, ()>> = WorkerPool::new(4).run(vec![], |i| Ok(*i));
        assert!(outcomes.is_empty());
    }

    #[test]
    fn every_item_yields_one_outcome_for_any_worker_count() {
        for workers in 1..=5 {
            let items: Vec<u32> = (0..5).collect();
            let outcomes = WorkerPool::new(workers).run(items, |i| Ok::<_, ()>(i * 10));
            let mut seen: Vec<u32> = outcomes.iter().map(|o| o.item).collect();
            seen.sort_unstable();
            assert_eq!(seen, vec![0, 1, 2, 3, 4], "workers = {workers}");
            assert!(outcomes.iter().all(|o| o.result == Ok(o.item * 10)));
        }
    }

    #[test]
    fn failures_do_not_cancel_other_jobs() {
        let outcomes = WorkerPool::new(2).run(vec![1, 2, 3, 4], |i| {
            if *i == 2 {
                Err("boom")
            } else {
                Ok(*i)
            }
        });
        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes.iter().filter(|o| o.result.is_err()).count(), 1);
    }

    #[test]
    fn concurrency_never_exceeds_worker_count() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let outcomes = WorkerPool::new(3).run((0..12).collect::<Vec<u32>>(), |_| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            active.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, ()>(())
        });
        assert_eq!(outcomes.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
