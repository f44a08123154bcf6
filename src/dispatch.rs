//! Worker-pool dispatch for heavy simulation requests
//!
//! A single invocation is CPU-bound for up to t_max * 2^n * n scalar steps,
//! so serving layers hand it to a dedicated pool instead of computing on a
//! latency-sensitive thread. When the pool cannot be built, or a worker dies
//! before delivering its result, the dispatcher degrades to synchronous
//! in-process execution and says so in the result trace. Isolation failure is
//! never fatal. There is no cancellation: once a run starts it completes;
//! callers wanting bounded latency enforce an external timeout and retry.

use std::sync::mpsc;
use std::sync::Arc;

use rayon::ThreadPool;

use crate::basis::TechnicalBasis;
use crate::error::SimulationError;
use crate::simulation::{simulate, SimulationInput, SimulationResult};

/// Warning appended to the trace when a request ran on the calling thread
pub const ISOLATION_WARNING: &str =
    "worker pool unavailable; simulation executed synchronously on the calling thread";

/// Dispatches simulations onto a dedicated worker pool around a shared,
/// read-only technical basis
pub struct SimulationDispatcher {
    basis: Arc<TechnicalBasis>,
    pool: Option<ThreadPool>,
}

impl SimulationDispatcher {
    /// Build a dispatcher. If the pool cannot be constructed every subsequent
    /// run falls back to synchronous execution.
    pub fn new(basis: Arc<TechnicalBasis>) -> Self {
        let pool = rayon::ThreadPoolBuilder::new().build();
        if let Err(err) = &pool {
            log::warn!("worker pool unavailable, simulations will run synchronously: {err}");
        }
        Self {
            basis,
            pool: pool.ok(),
        }
    }

    /// Number of worker threads; 0 when running without a pool
    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(0, ThreadPool::current_num_threads)
    }

    /// Run a simulation off the calling thread, blocking on its result
    /// channel. Falls back to a flagged synchronous run when the task cannot
    /// be isolated.
    pub fn run(&self, input: &SimulationInput) -> Result<SimulationResult, SimulationError> {
        let Some(pool) = &self.pool else {
            return self.run_synchronous(input);
        };

        let (sender, receiver) = mpsc::channel();
        let basis = Arc::clone(&self.basis);
        let task_input = input.clone();

        pool.spawn(move || {
            // A dropped receiver simply discards the result
            let _ = sender.send(simulate(&basis, &task_input));
        });

        match receiver.recv() {
            Ok(result) => result,
            // Worker died before sending; recover in-process
            Err(mpsc::RecvError) => self.run_synchronous(input),
        }
    }

    /// Run directly on the calling thread, appending the isolation warning.
    /// Also used by callers that explicitly opt out of offloading.
    pub fn run_synchronous(&self, input: &SimulationInput) -> Result<SimulationResult, SimulationError> {
        log::warn!("{ISOLATION_WARNING}");
        let mut result = simulate(&self.basis, input)?;
        result.trace.warnings.push(ISOLATION_WARNING.to_string());
        Ok(result)
    }

    pub fn basis(&self) -> &TechnicalBasis {
        &self.basis
    }
}
