use thiserror::Error;

/// Reasons a solve can fail. No partial solution is ever returned alongside one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The problem is malformed or outside what the configured solver accepts
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The entering column has no positive entry, so the objective can grow without limit
    #[error("Problem is unbounded")]
    Unbounded { column: usize },
    /// The iteration budget ran out, usually because degenerate pivots cycle
    #[error("Simplex did not converge within {iterations} iterations")]
    DidNotConverge { iterations: usize },
    /// Phase 1 could not drive the artificial variables to zero
    #[error("Problem is infeasible")]
    Infeasible,
}

impl SolveError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// True for errors caused by the caller's input rather than by the problem itself
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
