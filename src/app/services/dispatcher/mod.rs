//! Parallel check dispatcher
//!
//! Fans independent per-station jobs out over a bounded pool of blocking
//! workers. Every job runs in isolation: an error or a panic inside one job
//! becomes that job's outcome and never disturbs the others. The caller
//! collects every outcome with [`JobDispatcher::wait`].
//!
//! Jobs share no mutable state; a job that needs the catalog opens its own
//! handle from a [`crate::app::adapters::catalog::CatalogConnector`]. The
//! completion counter is the only value updated by several workers.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{self, JoinSet};
use tracing::{debug, error};

pub mod progress;

pub use progress::ProgressReporter;

type Job<T> = Box<dyn FnOnce() -> Result<T> + Send + 'static>;

/// Order in which results reach the callback and the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultOrder {
    /// Submission order
    #[default]
    Submission,
    /// Completion order
    Arrival,
}

/// Outcome of one submitted job
#[derive(Debug)]
pub struct JobResult<T> {
    /// Position in submission order
    pub index: usize,
    pub label: String,
    pub outcome: Result<T>,
}

/// Every outcome of a batch
#[derive(Debug)]
pub struct DispatchReport<T> {
    pub results: Vec<JobResult<T>>,
}

impl<T> DispatchReport<T> {
    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|v| (r.label.as_str(), v)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.label.as_str(), e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "job panicked".to_string())
}

/// Runs a job on the calling thread, turning a panic into an error
fn run_isolated<T>(label: &str, job: Job<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(job))
        .unwrap_or_else(|payload| Err(Error::job(label, panic_reason(payload))))
}

/// Bounded pool of isolated jobs with a join barrier
pub struct JobDispatcher<T> {
    semaphore: Arc<Semaphore>,
    workers: JoinSet<()>,
    sender: mpsc::UnboundedSender<JobResult<T>>,
    receiver: mpsc::UnboundedReceiver<JobResult<T>>,
    completed: Arc<AtomicUsize>,
    submitted: usize,
    serial: bool,
    queued: Vec<(usize, String, Job<T>)>,
    order: ResultOrder,
    progress: ProgressReporter,
}

impl<T: Send + 'static> JobDispatcher<T> {
    /// Dispatcher running at most `workers` jobs at once
    pub fn new(workers: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            workers: JoinSet::new(),
            sender,
            receiver,
            completed: Arc::new(AtomicUsize::new(0)),
            submitted: 0,
            serial: false,
            queued: Vec::new(),
            order: ResultOrder::default(),
            progress: ProgressReporter::hidden(),
        }
    }

    /// Run the jobs one after the other on the caller, in submission order
    pub fn serial(mut self, serial: bool) -> Self {
        self.serial = serial;
        self
    }

    pub fn with_order(mut self, order: ResultOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    /// Jobs finished so far, successful or not
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Queue a job; in parallel mode it starts as soon as a worker is free
    pub fn submit<F>(&mut self, label: impl Into<String>, job: F)
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let index = self.submitted;
        let label = label.into();
        self.submitted += 1;
        self.progress.add_total(1);

        if self.serial {
            self.queued.push((index, label, Box::new(job)));
            return;
        }

        let semaphore = Arc::clone(&self.semaphore);
        let sender = self.sender.clone();
        let completed = Arc::clone(&self.completed);
        let progress = self.progress.clone();

        self.workers.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    let job_label = label.clone();
                    match task::spawn_blocking(move || run_isolated(&job_label, Box::new(job))).await
                    {
                        Ok(outcome) => outcome,
                        Err(e) => Err(Error::job(&label, e.to_string())),
                    }
                }
                Err(e) => Err(Error::job(&label, format!("worker pool closed: {}", e))),
            };

            completed.fetch_add(1, Ordering::SeqCst);
            progress.tick(&label);
            if sender.send(JobResult { index, label, outcome }).is_err() {
                debug!("Result receiver dropped before job {} reported", index);
            }
        });
    }

    /// Block until every submitted job has finished
    ///
    /// `on_result` sees each result once, in the configured order. Failed
    /// jobs are reported, never re-raised.
    pub async fn wait<C>(mut self, mut on_result: C) -> DispatchReport<T>
    where
        C: FnMut(&JobResult<T>),
    {
        let expected = self.submitted;
        let mut arrived: Vec<JobResult<T>> = Vec::with_capacity(expected);
        let mut pending: BTreeMap<usize, JobResult<T>> = BTreeMap::new();

        for (index, label, job) in std::mem::take(&mut self.queued) {
            let outcome = run_isolated(&label, job);
            self.completed.fetch_add(1, Ordering::SeqCst);
            self.progress.tick(&label);
            let result = JobResult { index, label, outcome };
            on_result(&result);
            arrived.push(result);
        }
        let mut next_index = arrived.len();

        drop(self.sender);
        while let Some(result) = self.receiver.recv().await {
            if let Err(e) = &result.outcome {
                error!("{}: {}", result.label, e);
            }
            match self.order {
                ResultOrder::Arrival => {
                    on_result(&result);
                    arrived.push(result);
                }
                ResultOrder::Submission => {
                    pending.insert(result.index, result);
                    while let Some(ready) = pending.remove(&next_index) {
                        on_result(&ready);
                        arrived.push(ready);
                        next_index += 1;
                    }
                }
            }
        }

        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                error!("Dispatcher worker failed: {}", e);
            }
        }

        // anything still buffered arrived out of order around a lost worker
        for (_, result) in std::mem::take(&mut pending) {
            on_result(&result);
            arrived.push(result);
        }

        if self.order == ResultOrder::Submission {
            arrived.sort_by_key(|r| r.index);
        }
        self.progress.finish("done");
        debug!(
            "Dispatcher finished {} of {} jobs",
            self.completed.load(Ordering::SeqCst),
            expected
        );
        DispatchReport { results: arrived }
    }
}
