use skyfare_solver::SolveError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuggageError {
    /// Rejected before any computation; the message is safe to show to a client
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

impl LuggageError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// True when the caller supplied bad input, including input the solver itself refused
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::InvalidInput(_) => true,
            Self::Solve(e) => e.is_invalid_input(),
        }
    }
}
