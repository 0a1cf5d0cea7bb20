use thiserror::Error;

/// Errors produced by the diagnostic calculators.
///
/// Every calculator validates its input before doing any arithmetic, so an
/// error is always returned in place of a result and never alongside one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosticError {
    /// Malformed chain shapes, non-finite samples or out of range parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The input is well formed but the statistic is not defined for it,
    /// e.g. zero within-chain variance.
    #[error("undefined diagnostic: {0}")]
    UndefinedDiagnostic(String),
}

impl DiagnosticError {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        DiagnosticError::InvalidInput(msg.into())
    }

    pub(crate) fn undefined<S: Into<String>>(msg: S) -> Self {
        DiagnosticError::UndefinedDiagnostic(msg.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, DiagnosticError::InvalidInput(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, DiagnosticError::UndefinedDiagnostic(_))
    }
}

pub type Result<T> = std::result::Result<T, DiagnosticError>;
