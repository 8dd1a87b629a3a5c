use thiserror::Error;

/// Failure taxonomy for the sync engine.
///
/// Leaf operations return these instead of panicking; the orchestrator reads
/// most of them as "skip this unit, continue with the next". Only repeated
/// `Auth` failure terminates a run.
#[derive(Debug, Error)]
pub(crate) enum EngineError {
    /// Connection-level failure that survived the client's retry budget.
    #[error("transport failure after {attempts} attempts: {message}")]
    Transport { attempts: u32, message: String },

    /// Login or token check failed, or an endpoint answered with an
    /// authentication status.
    #[error("not logged in: {0}")]
    Auth(String),

    /// Response body did not match the expected schema; callers treat this as
    /// the call having returned no data.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// A server record references an identifier absent from the local tree.
    /// Skipped per record, never fatal to the batch.
    #[error("{entity} {id} not found in local tree")]
    Reconciliation { entity: &'static str, id: i64 },

    /// Fail-fast programmer-error signal, e.g. an element variant stored on a
    /// page whose content type forbids it. Aborts the current unit only.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl EngineError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }
}
