use thiserror::Error;

/// Errors surfaced by the contraction engine.
///
/// `InvariantViolation` marks internal consistency failures (a bug in the
/// enumeration/evaluation pipeline, never a user mistake). `OddRankOperator`
/// is a rejected input: contraction canonicalization is only defined for
/// operators with an even number of second-quantized operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WickError {
    #[error("operator '{label}' has odd rank {rank}: only even-rank operators can be canonicalized")]
    OddRankOperator { label: String, rank: usize },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("parse error: {0}")]
    Parse(String),
}
