//! Error taxonomy for the lifting pipeline.
//!
//! Every fallible step returns one of these variants; the pipeline aborts a
//! document's conversion on the first error and propagates it unchanged.

use delambda_diagnostics::{Diagnostic, DiagnosticCode, Span};
use thiserror::Error;

/// Errors produced while converting one document.
#[derive(Debug, Error)]
pub enum LiftError {
    /// The text cannot be parsed, or the document has no declaration to
    /// anchor holder classes into.
    #[error("improper input: {0}")]
    ImproperInput(String),

    /// A closure reads an instance-bound binding (a field or the enclosing
    /// instance itself). The holder class carries no reference to the
    /// original instance, so these captures cannot be represented.
    #[error("closure captures instance-bound `{name}`")]
    CaptureViolation { name: String, span: Span },

    /// A parameter, return, or capture type cannot be resolved to a concrete
    /// type. The input program does not type-check as far as the front end
    /// can tell.
    #[error("cannot resolve the type of {what}")]
    TypeResolution { what: String, span: Span },

    /// Nested or recursive closures, or any other construct that would
    /// produce an incorrect program if converted.
    #[error("unsupported transformation: {reason}")]
    Unsupported { reason: String, span: Span },

    /// Reading or writing a document failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl LiftError {
    /// The diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            LiftError::ImproperInput(_) => DiagnosticCode::ImproperInput,
            LiftError::CaptureViolation { .. } => DiagnosticCode::CaptureViolation,
            LiftError::TypeResolution { .. } => DiagnosticCode::TypeResolution,
            LiftError::Unsupported { .. } => DiagnosticCode::UnsupportedTransformation,
            LiftError::Io(_) => DiagnosticCode::IoFailure,
        }
    }

    /// The source span this error points at, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            LiftError::CaptureViolation { span, .. }
            | LiftError::TypeResolution { span, .. }
            | LiftError::Unsupported { span, .. } => Some(*span),
            LiftError::ImproperInput(_) | LiftError::Io(_) => None,
        }
    }

    /// Render this error as a diagnostic for the emitters.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut builder = Diagnostic::error(self.code(), self.to_string());
        if let Some(span) = self.span() {
            builder = builder.with_span(span);
        }
        if let LiftError::CaptureViolation { .. } = self {
            builder = builder.with_help(
                "only locals and parameters of enclosing functions can be captured",
            );
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = LiftError::CaptureViolation {
            name: "a".into(),
            span: Span::DUMMY,
        };
        assert_eq!(err.code().as_str(), "L001");

        let err = LiftError::ImproperInput("no declarations".into());
        assert_eq!(err.code().as_str(), "P001");
        assert!(err.span().is_none());
    }
}
