//! User validators and failure aggregation.

use crate::read_states::ReadState;

/// Validates a pending read state before it is announced.
pub trait Validator: Send {
    /// Checks the pending state; an `Err` fails the cycle.
    ///
    /// # Errors
    ///
    /// Returns the validation failure to report.
    fn validate(&self, read_state: &ReadState) -> anyhow::Result<()>;
}

impl<F> Validator for F
where
    F: Fn(&ReadState) -> anyhow::Result<()> + Send,
{
    fn validate(&self, read_state: &ReadState) -> anyhow::Result<()> {
        self(read_state)
    }
}

/// Aggregated validator failures for one cycle.
///
/// Every validator runs even after one fails; the failures are collected in
/// encounter order, the first being the primary cause.
#[derive(Debug, thiserror::Error)]
#[error(
    "validation failed with {} failure(s), first: {}",
    failures.len(),
    failures.first().map_or_else(|| "unknown".to_string(), ToString::to_string)
)]
pub struct ValidationError {
    /// Individual validator failures, in encounter order.
    pub failures: Vec<anyhow::Error>,
}

impl ValidationError {
    pub(crate) fn new(failures: Vec<anyhow::Error>) -> Self {
        Self { failures }
    }

    /// The first failure encountered.
    #[must_use]
    pub fn primary_cause(&self) -> Option<&anyhow::Error> {
        self.failures.first()
    }
}
