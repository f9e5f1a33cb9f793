//! Comment admission and vote ledger.
//!
//! Both entry points hold their collaborators explicitly; nothing here
//! reaches for process-global state. Business-rule failures come back as
//! [`EngineError`] before any write happens, and store or collaborator
//! failures are logged here and surfaced as `EngineError::Internal`.

mod admission;
mod vote;

#[cfg(test)]
mod testing;

pub use admission::{AdmissionEngine, Admitted};
pub use domain::EngineError;
pub use vote::VoteLedger;

use tracing::error;

/// Logs the full error chain and collapses it to the generic client-facing error.
pub(crate) fn internal(context: &'static str) -> impl FnOnce(anyhow::Error) -> EngineError {
    move |e| {
        error!("{}: {:?}", context, e);
        EngineError::Internal
    }
}
