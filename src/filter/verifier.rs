//! Thread-affinity verification for thread-pinned resources.
//!
//! Filter jobs and the structures they drive are not thread-safe; each one is
//! pinned to the thread that started executing it. The verifier captures that
//! thread's identity and rejects calls from any other thread, but only while
//! the process-wide diagnostics gate is active, so release setups pay nothing
//! for the check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};

use crate::error::EngineError;

/// Diagnostics gate; defaults to on for debug builds.
static THREAD_CHECKS: AtomicBool = AtomicBool::new(cfg!(debug_assertions));

/// Enables or disables thread-affinity checking process-wide.
pub fn set_thread_checks_active(active: bool) {
    THREAD_CHECKS.store(active, Ordering::Release);
}

/// Whether thread-affinity checking is currently active.
pub fn thread_checks_active() -> bool {
    THREAD_CHECKS.load(Ordering::Acquire)
}

/// Capability object bound to the thread it was created on.
#[derive(Debug, Clone)]
pub struct ThreadVerifier {
    owner: ThreadId,
    owner_name: String,
}

impl ThreadVerifier {
    /// Binds a verifier to the calling thread.
    pub fn for_current_thread(label: &str) -> Self {
        let current = thread::current();
        let owner_name = format!(
            "{} [{}]",
            current.name().unwrap_or("unnamed"),
            label
        );
        log::trace!("thread verifier bound: {owner_name}");
        Self {
            owner: current.id(),
            owner_name,
        }
    }

    /// Fails fast when called from a thread other than the owner, provided
    /// the diagnostics gate is active. No-op (and no cost beyond one atomic
    /// load) otherwise.
    pub fn check(&self) -> Result<(), EngineError> {
        if !thread_checks_active() {
            return Ok(());
        }
        if thread::current().id() != self.owner {
            return Err(EngineError::ForeignThread {
                owner: self.owner_name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both gate states exercised in one test, since the gate is process-wide
    // and the test harness runs tests in parallel threads.
    #[test]
    fn test_foreign_thread_detection_and_gate() {
        let verifier = ThreadVerifier::for_current_thread("test");

        set_thread_checks_active(true);
        assert!(verifier.check().is_ok());

        let cross = {
            let verifier = verifier.clone();
            thread::spawn(move || verifier.check()).join().unwrap()
        };
        assert!(matches!(cross, Err(EngineError::ForeignThread { .. })));

        set_thread_checks_active(false);
        let cross = {
            let verifier = verifier.clone();
            thread::spawn(move || verifier.check()).join().unwrap()
        };
        assert!(cross.is_ok());

        set_thread_checks_active(true);
    }
}
