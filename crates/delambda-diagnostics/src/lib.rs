//! Diagnostic infrastructure for the delambda closure lifter.
//!
//! This crate provides structured error reporting with:
//! - Source location tracking (file, line, column)
//! - Diagnostic types with stable error codes
//! - Multiple output formats (terminal, JSON, simple text)
//!
//! # Example
//!
//! ```
//! use delambda_diagnostics::{
//!     Diagnostic, DiagnosticCode,
//!     Span, SourceCache,
//!     TerminalEmitter, DiagnosticEmitter,
//! };
//!
//! // Create a source cache and add a file
//! let mut cache = SourceCache::new();
//! let file_id = cache.add_file("test.ts", "const f = (m) => m + a;".to_string());
//!
//! // Create a diagnostic
//! let diag = Diagnostic::error(DiagnosticCode::CaptureViolation, "closure captures `a`")
//!     .with_span(Span::new(file_id, 10, 22))
//!     .with_help("only locals and parameters of enclosing functions can be captured")
//!     .build();
//!
//! // Emit to stderr
//! let stderr = std::io::stderr();
//! let mut emitter = TerminalEmitter::new(stderr.lock(), true);
//! emitter.emit(&diag, &cache).unwrap();
//! ```

pub mod diagnostic;
pub mod emitter;
pub mod source_cache;
pub mod span;

// Re-export commonly used types
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Diagnostics, Severity};
pub use emitter::{DiagnosticEmitter, JsonEmitter, SimpleEmitter, TerminalEmitter};
pub use source_cache::{SourceCache, SourceFile};
pub use span::{FileId, Label, LabelStyle, Location, Span};
