//! Filter processor: lifecycle state machine, builder and parallel dispatch.
//!
//! A processor merges the configured sorted index sources into one global
//! stream, partitions it across filter jobs, duplicates the query expression
//! per job and fans the jobs out over a rayon pool. Lifecycle state is the
//! only cross-thread mutable field and moves exclusively through
//! compare-and-swap transitions.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::annotation::fixed_keys::FixedKeysLongStorage;
use crate::error::EngineError;
use crate::eval::expression::{DuplicationContext, EvaluationContext, Expression};
use crate::filter::job::{
    CandidateLookup, ExpressionFilter, FilterContext, FilterJob, JobError,
};
use crate::index::heap_merge::HeapMerge;
use crate::index::range::IndexRange;

/// Lifecycle state of a processor.
///
/// `Finished` and `Ignored` are terminal; their ordinals sit at and above the
/// terminal threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum ProcessorState {
    Waiting = 0,
    Prepared = 1,
    Finished = 2,
    Ignored = 3,
}

impl ProcessorState {
    fn from_u8(raw: u8) -> ProcessorState {
        match raw {
            0 => ProcessorState::Waiting,
            1 => ProcessorState::Prepared,
            2 => ProcessorState::Finished,
            _ => ProcessorState::Ignored,
        }
    }

    /// Whether the state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        self as u8 >= ProcessorState::Finished as u8
    }
}

/// Outcome of one job, flattened for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub id: String,
    pub matched: usize,
    pub interrupted: bool,
    pub error: Option<String>,
}

/// Aggregated result of a processor run.
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    /// Admitted candidate indices, globally ascending.
    pub matched: Vec<u64>,
    /// Interval spanned by the admitted indices; unset when nothing matched.
    pub matched_range: IndexRange,
    pub jobs: Vec<JobOutcome>,
}

impl FilterReport {
    /// Whether any job recorded an error (interruption does not count).
    pub fn has_failures(&self) -> bool {
        self.jobs.iter().any(|j| j.error.is_some())
    }

    pub fn was_interrupted(&self) -> bool {
        self.jobs.iter().any(|j| j.interrupted)
    }
}

/// Drives a set of filter jobs through their lifecycle.
pub struct FilterProcessor {
    state: AtomicU8,
    jobs: Vec<FilterJob>,
    pool: Option<Arc<rayon::ThreadPool>>,
    cancelled: Arc<AtomicBool>,
}

impl FilterProcessor {
    /// Starts a builder; see [`FilterProcessorBuilder`].
    pub fn builder() -> FilterProcessorBuilder {
        FilterProcessorBuilder::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProcessorState {
        ProcessorState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Attempts the transition `expected -> next`.
    ///
    /// Fails with [`EngineError::IllegalState`] once the state is terminal.
    /// Otherwise swaps atomically iff the current state equals `expected`,
    /// returning whether this caller performed the swap; a `false` means a
    /// competing transition got there first and must be handled, not ignored.
    pub fn try_set_state(
        &self,
        expected: ProcessorState,
        next: ProcessorState,
    ) -> Result<bool, EngineError> {
        let current = self.state();
        if current.is_terminal() {
            return Err(EngineError::IllegalState(format!(
                "processor already finalized in state {current:?}"
            )));
        }
        let swapped = self
            .state
            .compare_exchange(
                expected as u8,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if swapped {
            log::debug!("processor state: {expected:?} -> {next:?}");
        }
        Ok(swapped)
    }

    /// Requests cooperative cancellation of all running jobs.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Marks the processor as ignored without running any job.
    pub fn ignore(&self) -> Result<bool, EngineError> {
        self.try_set_state(ProcessorState::Waiting, ProcessorState::Ignored)
    }

    /// Runs all jobs and aggregates their outcomes.
    ///
    /// Drives `Waiting -> Prepared -> Finished`; job-level failures never
    /// abort the run, they surface in the report.
    pub fn process(&mut self) -> Result<FilterReport, EngineError> {
        if !self.try_set_state(ProcessorState::Waiting, ProcessorState::Prepared)? {
            return Err(EngineError::IllegalState(format!(
                "cannot prepare processor in state {:?}",
                self.state()
            )));
        }

        let jobs = &mut self.jobs;
        match &self.pool {
            Some(pool) => pool.install(|| jobs.par_iter_mut().for_each(FilterJob::run)),
            None => jobs.par_iter_mut().for_each(FilterJob::run),
        }

        if !self.try_set_state(ProcessorState::Prepared, ProcessorState::Finished)? {
            return Err(EngineError::IllegalState(format!(
                "cannot finalize processor in state {:?}",
                self.state()
            )));
        }

        // Jobs own contiguous ascending chunks, so concatenation in job order
        // keeps the global stream ascending.
        let mut matched = Vec::new();
        let mut matched_range = IndexRange::new();
        let mut outcomes = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            matched.extend_from_slice(job.matched());
            for &index in job.matched() {
                matched_range.update(index as i64);
            }
            outcomes.push(JobOutcome {
                id: job.id().to_string(),
                matched: job.matched().len(),
                interrupted: job.is_interrupted(),
                error: job.error().map(|e| match e {
                    JobError::Filter(err) => format!("filter: {err}"),
                    JobError::Unexpected(message) => format!("unexpected: {message}"),
                }),
            });
        }
        log::debug!(
            "processor finished: {} matches across {} jobs",
            matched.len(),
            outcomes.len()
        );
        Ok(FilterReport {
            matched,
            matched_range,
            jobs: outcomes,
        })
    }
}

/// Collects and validates the configuration of a [`FilterProcessor`].
#[derive(Default)]
pub struct FilterProcessorBuilder {
    pool: Option<Arc<rayon::ThreadPool>>,
    lookup: Option<CandidateLookup>,
    storage: Option<Arc<FixedKeysLongStorage>>,
    query: Option<Expression>,
    sources: Vec<Box<dyn Iterator<Item = u64> + Send>>,
    job_count: usize,
}

impl FilterProcessorBuilder {
    /// Dedicated rayon pool; defaults to the global pool.
    pub fn pool(mut self, pool: Arc<rayon::ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn candidate_lookup(mut self, lookup: CandidateLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn storage(mut self, storage: Arc<FixedKeysLongStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn query(mut self, query: Expression) -> Self {
        self.query = Some(query);
        self
    }

    /// Adds one sorted ascending index source.
    pub fn source(mut self, source: impl Iterator<Item = u64> + Send + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn job_count(mut self, job_count: usize) -> Self {
        self.job_count = job_count;
        self
    }

    /// Validates the configuration and assembles the processor.
    ///
    /// Merges the sources through [`HeapMerge`], partitions the stream into
    /// contiguous chunks, optimizes the query once and duplicates it per job.
    pub fn build(self) -> Result<FilterProcessor, EngineError> {
        let lookup = self
            .lookup
            .ok_or_else(|| EngineError::InvalidInput("missing candidate lookup".to_string()))?;
        let storage = self
            .storage
            .ok_or_else(|| EngineError::InvalidInput("missing annotation storage".to_string()))?;
        let query = self
            .query
            .ok_or_else(|| EngineError::InvalidInput("missing query expression".to_string()))?;
        let job_count = if self.job_count == 0 { 1 } else { self.job_count };

        let merged: Vec<u64> = HeapMerge::new(self.sources).collect();
        let chunk_size = merged.len().div_ceil(job_count).max(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let query = query.optimize();

        let mut jobs = Vec::with_capacity(job_count);
        for (ordinal, chunk) in merged.chunks(chunk_size).enumerate() {
            let mut dup = DuplicationContext::new();
            let expression = query.duplicate(&mut dup);
            let filter = ExpressionFilter::new(expression, EvaluationContext::for_duplication(&dup));
            let context = FilterContext::new(
                Arc::clone(&lookup),
                Arc::clone(&storage),
                chunk.to_vec(),
                Arc::clone(&cancelled),
            );
            jobs.push(FilterJob::new(
                format!("job-{ordinal}"),
                Box::new(filter),
                context,
            ));
        }

        log::debug!(
            "processor built: {} candidates over {} jobs",
            merged.len(),
            jobs.len()
        );
        Ok(FilterProcessor {
            state: AtomicU8::new(ProcessorState::Waiting as u8),
            jobs,
            pool: self.pool,
            cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::lookup::BinarySearchLookup;
    use crate::eval::expression::ComparisonOp;
    use crate::eval::value::Value;
    use crate::model::{Container, Item};

    fn storage_with_pos(values: &[(u64, i64)]) -> Arc<FixedKeysLongStorage> {
        let lookup = BinarySearchLookup::new(vec!["lemma".into(), "pos".into()]).unwrap();
        let mut storage = FixedKeysLongStorage::new(Arc::new(lookup), None);
        for &(item, value) in values {
            storage.set_long(Item::new(item), "pos", value).unwrap();
        }
        Arc::new(storage)
    }

    fn identity_lookup() -> CandidateLookup {
        Arc::new(|index| Some(Container::new(index, vec![Item::new(index)])))
    }

    fn pos_query(threshold: i64) -> Expression {
        Expression::comparison(
            ComparisonOp::Gt,
            Expression::annotation("pos"),
            Expression::literal(Value::Long(threshold)),
        )
    }

    #[test]
    fn test_end_to_end_processing() {
        let storage = storage_with_pos(&[(1, 5), (3, 20), (4, 30), (6, 2), (9, 11)]);
        let mut processor = FilterProcessor::builder()
            .candidate_lookup(identity_lookup())
            .storage(storage)
            .query(pos_query(10))
            .source(vec![1u64, 4, 9].into_iter())
            .source(vec![3u64, 6].into_iter())
            .job_count(2)
            .build()
            .unwrap();

        assert_eq!(processor.state(), ProcessorState::Waiting);
        let report = processor.process().unwrap();

        assert_eq!(processor.state(), ProcessorState::Finished);
        assert_eq!(report.matched, vec![3, 4, 9]);
        assert_eq!(report.matched_range.min(), 3);
        assert_eq!(report.matched_range.max(), 9);
        assert_eq!(report.jobs.len(), 2);
        assert!(!report.has_failures());
        assert!(!report.was_interrupted());
    }

    #[test]
    fn test_process_twice_fails() {
        let mut processor = FilterProcessor::builder()
            .candidate_lookup(identity_lookup())
            .storage(storage_with_pos(&[]))
            .query(pos_query(0))
            .job_count(1)
            .build()
            .unwrap();

        processor.process().unwrap();
        assert!(matches!(
            processor.process(),
            Err(EngineError::IllegalState(_))
        ));
    }

    #[test]
    fn test_ignore_blocks_processing() {
        let mut processor = FilterProcessor::builder()
            .candidate_lookup(identity_lookup())
            .storage(storage_with_pos(&[]))
            .query(pos_query(0))
            .build()
            .unwrap();

        assert!(processor.ignore().unwrap());
        assert_eq!(processor.state(), ProcessorState::Ignored);
        assert!(matches!(
            processor.process(),
            Err(EngineError::IllegalState(_))
        ));
        // Already terminal; even the matching transition fails.
        assert!(processor
            .try_set_state(ProcessorState::Ignored, ProcessorState::Finished)
            .is_err());
    }

    #[test]
    fn test_processor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FilterProcessor>();
        assert_send_sync::<Arc<FilterProcessor>>();
    }

    #[test]
    fn test_concurrent_transitions_have_one_winner() {
        let processor = FilterProcessor::builder()
            .candidate_lookup(identity_lookup())
            .storage(storage_with_pos(&[]))
            .query(pos_query(0))
            .build()
            .unwrap();
        let processor = Arc::new(processor);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let processor = Arc::clone(&processor);
            handles.push(std::thread::spawn(move || {
                processor
                    .try_set_state(ProcessorState::Waiting, ProcessorState::Prepared)
                    .unwrap()
            }));
        }
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(processor.state(), ProcessorState::Prepared);
    }

    #[test]
    fn test_builder_validation() {
        let missing_lookup = FilterProcessor::builder()
            .storage(storage_with_pos(&[]))
            .query(pos_query(0))
            .build();
        assert!(matches!(missing_lookup, Err(EngineError::InvalidInput(_))));

        let missing_query = FilterProcessor::builder()
            .candidate_lookup(identity_lookup())
            .storage(storage_with_pos(&[]))
            .build();
        assert!(matches!(missing_query, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_cancellation_reported_as_interruption() {
        let storage = storage_with_pos(&[(0, 5)]);
        let mut processor = FilterProcessor::builder()
            .candidate_lookup(identity_lookup())
            .storage(storage)
            .query(pos_query(0))
            .source(vec![0u64].into_iter())
            .build()
            .unwrap();

        processor.cancel();
        let report = processor.process().unwrap();
        assert!(report.was_interrupted());
        assert!(!report.has_failures());
        assert!(report.matched.is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let mut processor = FilterProcessor::builder()
            .candidate_lookup(identity_lookup())
            .storage(storage_with_pos(&[(2, 9)]))
            .query(pos_query(5))
            .source(vec![2u64].into_iter())
            .build()
            .unwrap();
        let report = processor.process().unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["matched"], serde_json::json!([2]));
        assert_eq!(json["jobs"][0]["interrupted"], serde_json::json!(false));
    }
}
