use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::run::{Interruption, RunContext};

/// Runs work items concurrently with at most `worker_cap` of them in flight.
///
/// A slot is taken from the semaphore *before* a worker task is spawned, so the
/// number of live workers never exceeds the cap no matter how many items are
/// submitted. The slot travels with the task and is released when the task
/// ends, whether the work finished, panicked, or was aborted.
#[derive(Debug, Clone)]
pub struct BoundedDispatcher {
    slots: Arc<Semaphore>,
    worker_cap: usize,
}

impl BoundedDispatcher {
    /// `worker_cap` is raised to 1 when given as zero.
    pub fn new(worker_cap: usize) -> Self {
        let worker_cap = worker_cap.max(1);
        Self {
            slots: Arc::new(Semaphore::new(worker_cap)),
            worker_cap,
        }
    }

    pub fn worker_cap(&self) -> usize {
        self.worker_cap
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Submit every item, forwarding each `Some` output into `results`.
    ///
    /// Returns once all items have been handed to workers, or as soon as `run`
    /// is interrupted; finished and unfinished workers alike are tracked by the
    /// returned [`Dispatch`]. `results` must have room for one message per
    /// item, otherwise a worker could wait on the send while holding its slot.
    /// This call's sender is dropped on return, so the channel closes once the
    /// last worker exits.
    pub async fn submit_all<T, R, F, Fut>(
        &self,
        run: &RunContext,
        items: Vec<T>,
        work: F,
        results: mpsc::Sender<R>,
    ) -> Dispatch
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<R>> + Send + 'static,
    {
        let work = Arc::new(work);
        let mut workers = JoinSet::new();
        let mut submitted = 0;
        let mut interrupted = run.interruption();

        if interrupted.is_none() {
            for item in items {
                let slot = tokio::select! {
                    biased;
                    reason = run.interrupted() => {
                        interrupted = Some(reason);
                        break;
                    }
                    slot = self.slots.clone().acquire_owned() => match slot {
                        Ok(slot) => slot,
                        // The semaphore is never closed while `self` is alive.
                        Err(_) => break,
                    },
                };

                let work = Arc::clone(&work);
                let results = results.clone();
                let run = run.clone();
                workers.spawn(async move {
                    let _slot = slot;
                    let output = tokio::select! {
                        biased;
                        _ = run.interrupted() => None,
                        output = work(item) => output,
                    };
                    if let Some(output) = output {
                        let _ = results.send(output).await;
                    }
                });
                submitted += 1;
            }
        }

        Dispatch {
            workers,
            submitted,
            interrupted,
        }
    }
}

/// Handle to the workers spawned by one [`BoundedDispatcher::submit_all`] call.
#[derive(Debug)]
pub struct Dispatch {
    workers: JoinSet<()>,
    submitted: usize,
    interrupted: Option<Interruption>,
}

/// What the completion barrier saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Completion {
    pub finished: usize,
    pub panicked: usize,
    pub aborted: usize,
}

impl Dispatch {
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Set when submission stopped early because the run was interrupted.
    pub fn interrupted(&self) -> Option<Interruption> {
        self.interrupted
    }

    /// Completion barrier: wait for every worker to exit.
    pub async fn wait(mut self) -> Completion {
        let mut completion = Completion::default();
        while let Some(joined) = self.workers.join_next().await {
            match joined {
                Ok(()) => completion.finished += 1,
                Err(err) if err.is_panic() => completion.panicked += 1,
                Err(_) => completion.aborted += 1,
            }
        }
        completion
    }

    /// Abort outstanding workers, then wait for all of them to exit so every
    /// slot is back in the pool before this returns.
    pub async fn abort(mut self) -> Completion {
        self.workers.abort_all();
        self.wait().await
    }
}
