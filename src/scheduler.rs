use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::{Scope, ThreadPool, ThreadPoolBuilder};

use crate::error::{ApError, Result};

/// Bounded pool of worker threads that runs a phase of independent jobs.
///
/// A phase is opened with [`JobScheduler::phase`]; every job submitted inside it has
/// finished by the time `phase` returns, which makes the call a barrier between phases.
/// Jobs may borrow from the caller's stack, so a phase can read the matrices settled by
/// the previous phase while writing disjoint parts of the next one.
///
/// When the pool has not been started, jobs run inline on the calling thread in
/// submission order.
pub struct JobScheduler {
    workers: usize,
    pool: Option<ThreadPool>,
}

impl JobScheduler {
    /// `workers == 0` selects one worker per available hardware thread.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            pool: None,
        }
    }

    /// Provision the worker threads. Calling `start` on a running scheduler does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.pool.is_some() {
            return Ok(());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|idx| format!("affprop-worker-{}", idx))
            .build()?;
        self.pool = Some(pool);
        Ok(())
    }

    /// Join the worker threads. Later phases run inline until `start` is called again.
    pub fn stop(&mut self) {
        self.pool.take();
    }

    pub fn is_running(&self) -> bool {
        self.pool.is_some()
    }

    /// Number of threads jobs are spread over
    pub fn workers(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => 1,
        }
    }

    /// Submit a phase of jobs and block until all of them have completed.
    ///
    /// A panic in any job is reported as [`ApError::WorkerPanic`] once the remaining jobs
    /// of the phase have drained.
    pub fn phase<'scope, OP>(&self, name: &'static str, op: OP) -> Result<()>
    where
        OP: for<'p> FnOnce(&Phase<'p, 'scope>) + Send,
    {
        let outcome = match &self.pool {
            Some(pool) => catch_unwind(AssertUnwindSafe(|| {
                pool.scope(|scope| op(&Phase::Pooled(scope)))
            })),
            None => catch_unwind(AssertUnwindSafe(|| op(&Phase::Inline))),
        };
        outcome.map_err(|payload| ApError::WorkerPanic {
            phase: name,
            message: panic_message(payload),
        })
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Handle for submitting the jobs of one phase.
pub enum Phase<'p, 'scope> {
    Pooled(&'p Scope<'scope>),
    Inline,
}

impl<'p, 'scope> Phase<'p, 'scope> {
    /// Enqueue a zero-argument unit of work. Completion order is unspecified.
    pub fn submit<J>(&self, job: J)
    where
        J: FnOnce() + Send + 'scope,
    {
        match self {
            Phase::Pooled(scope) => scope.spawn(move |_| job()),
            Phase::Inline => job(),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
