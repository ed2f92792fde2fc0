//! Per-thread filter jobs.
//!
//! Each job owns one filter, one slice of the merged candidate index stream
//! and one evaluation context. A job runs on exactly one executor thread; the
//! thread verifier is bound lazily at the start of `run()`, since the actual
//! thread is only decided at submission time. Failures are captured on the
//! job object and never propagated across the thread boundary.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::annotation::fixed_keys::FixedKeysLongStorage;
use crate::error::EngineError;
use crate::eval::expression::{EvaluationContext, Expression};
use crate::eval::matcher::Matcher;
use crate::filter::verifier::ThreadVerifier;
use crate::model::Container;

/// Resolves a candidate container for a global index.
pub type CandidateLookup = Arc<dyn Fn(u64) -> Option<Container> + Send + Sync>;

/// Domain errors a filter can report.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Cooperative cancellation observed between candidates.
    #[error("Filter interrupted")]
    Interrupted,

    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EngineError),
}

/// Failure captured on a finished job.
///
/// Domain errors and unexpected failures (panics) are reported as distinct
/// categories; interruption is tracked separately and never lands here.
#[derive(Debug)]
pub enum JobError {
    Filter(FilterError),
    Unexpected(String),
}

/// One unit of filtering logic, invoked once per job run.
///
/// `Send + Sync` so that a processor holding boxed filters can itself be
/// shared across threads; mutation goes through `&mut self` only.
pub trait Filter: Send + Sync {
    fn filter(&mut self, ctx: &mut FilterContext) -> Result<(), FilterError>;
}

/// Per-job execution state shared with the filter.
pub struct FilterContext {
    lookup: CandidateLookup,
    storage: Arc<FixedKeysLongStorage>,
    indices: Vec<u64>,
    cancelled: Arc<AtomicBool>,
    matched: Vec<u64>,
}

impl FilterContext {
    pub fn new(
        lookup: CandidateLookup,
        storage: Arc<FixedKeysLongStorage>,
        indices: Vec<u64>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            lookup,
            storage,
            indices,
            cancelled,
            matched: Vec::new(),
        }
    }

    /// Number of candidate indices assigned to this job.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Candidate index at `pos`, or `None` past the end of the slice.
    pub fn index_at(&self, pos: usize) -> Option<u64> {
        self.indices.get(pos).copied()
    }

    /// Resolves the container for a global index through the caller-supplied
    /// lookup.
    pub fn resolve(&self, index: u64) -> Option<Container> {
        (self.lookup)(index)
    }

    pub fn storage(&self) -> &FixedKeysLongStorage {
        &self.storage
    }

    /// Errors with [`FilterError::Interrupted`] once cancellation was
    /// requested. Filters call this between candidates.
    pub fn check_cancelled(&self) -> Result<(), FilterError> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(FilterError::Interrupted);
        }
        Ok(())
    }

    /// Records an admitted candidate index.
    pub fn admit(&mut self, index: u64) {
        self.matched.push(index);
    }

    /// Indices admitted so far, in processing order.
    pub fn matched(&self) -> &[u64] {
        &self.matched
    }
}

/// Standard filter: evaluates an expression per candidate and admits on a
/// boolean `true` verdict.
pub struct ExpressionFilter {
    expression: Expression,
    env: EvaluationContext,
}

impl ExpressionFilter {
    pub fn new(expression: Expression, env: EvaluationContext) -> Self {
        Self { expression, env }
    }
}

impl Filter for ExpressionFilter {
    fn filter(&mut self, ctx: &mut FilterContext) -> Result<(), FilterError> {
        for pos in 0..ctx.len() {
            ctx.check_cancelled()?;
            let Some(index) = ctx.index_at(pos) else {
                break;
            };
            let Some(candidate) = ctx.resolve(index) else {
                log::trace!("no candidate for index {index}, skipping");
                continue;
            };
            self.env.reset();
            let verdict = self
                .expression
                .evaluate(ctx.storage(), &candidate, &mut self.env)?;
            if verdict.as_boolean().map_err(FilterError::from)? {
                ctx.admit(index);
            }
        }
        Ok(())
    }
}

/// Admits candidates carrying at least one explicitly set annotation whose
/// key matches the given matcher.
pub struct KeyFilter {
    matcher: Matcher,
}

impl KeyFilter {
    pub fn new(matcher: Matcher) -> Self {
        Self { matcher }
    }
}

impl Filter for KeyFilter {
    fn filter(&mut self, ctx: &mut FilterContext) -> Result<(), FilterError> {
        for pos in 0..ctx.len() {
            ctx.check_cancelled()?;
            let Some(index) = ctx.index_at(pos) else {
                break;
            };
            let Some(candidate) = ctx.resolve(index) else {
                continue;
            };
            let mut hit = false;
            for item in &candidate.items {
                ctx.storage().collect_keys(*item, |key| {
                    hit |= self.matcher.matches(key);
                });
                if hit {
                    break;
                }
            }
            if hit {
                ctx.admit(index);
            }
        }
        Ok(())
    }
}

/// One filter invocation pinned to a single worker thread.
pub struct FilterJob {
    id: String,
    filter: Box<dyn Filter>,
    context: FilterContext,
    verifier: Option<ThreadVerifier>,
    error: Option<JobError>,
    interrupted: bool,
    finished: bool,
}

impl FilterJob {
    pub fn new(id: impl Into<String>, filter: Box<dyn Filter>, context: FilterContext) -> Self {
        Self {
            id: id.into(),
            filter,
            context,
            verifier: None,
            error: None,
            interrupted: false,
            finished: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Runs the filter on the calling thread.
    ///
    /// Binds the thread verifier first, then classifies the outcome: clean
    /// completion, interruption (dedicated flag, no error recorded), domain
    /// error, or unexpected failure (caught panic).
    pub fn run(&mut self) {
        self.verifier = Some(ThreadVerifier::for_current_thread(&self.id));
        log::debug!("filter job {} started ({} candidates)", self.id, self.context.len());

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.filter.filter(&mut self.context)
        }));
        match outcome {
            Ok(Ok(())) => {
                log::debug!(
                    "filter job {} finished, {} matches",
                    self.id,
                    self.context.matched().len()
                );
            }
            Ok(Err(FilterError::Interrupted)) => {
                log::debug!("filter job {} interrupted", self.id);
                self.interrupted = true;
            }
            Ok(Err(err)) => {
                log::warn!("filter job {} failed: {err}", self.id);
                self.error = Some(JobError::Filter(err));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!("filter job {} panicked: {message}", self.id);
                self.error = Some(JobError::Unexpected(message));
            }
        }
        self.finished = true;
    }

    /// Verifies the calling thread is the one the job ran on.
    ///
    /// Calling before the verifier has been bound (i.e. before `run()`) is a
    /// programming error and fails with an illegal-state signal.
    pub fn check_thread(&self) -> Result<(), EngineError> {
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            EngineError::IllegalState(format!(
                "thread verifier of job {} not bound yet",
                self.id
            ))
        })?;
        verifier.check()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn error(&self) -> Option<&JobError> {
        self.error.as_ref()
    }

    /// Indices this job admitted.
    pub fn matched(&self) -> &[u64] {
        self.context.matched()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unidentified panic payload".to_string()
    }
}
