//! Filter processing and concurrency harness.
//!
//! This module is organized into the following submodules:
//! - `verifier`: thread-affinity verification ("tripwire")
//! - `job`: per-thread filter jobs and the `Filter` trait
//! - `processor`: lifecycle state machine, builder, parallel dispatch

pub mod job;
pub mod processor;
pub mod verifier;

pub use job::{ExpressionFilter, Filter, FilterContext, FilterError, FilterJob, JobError, KeyFilter};
pub use processor::{
    FilterProcessor, FilterProcessorBuilder, FilterReport, JobOutcome, ProcessorState,
};
pub use verifier::{set_thread_checks_active, thread_checks_active, ThreadVerifier};
