//! Structured build diagnostics and the accumulating sink.
//!
//! Recoverable build failures — an unresolved source processor, a plugin
//! invocation that raised an error, a failed link — are reported as
//! structured [`Diagnostic`] messages tagged with the owning package and
//! target architecture, not propagated as control-flow errors. The
//! thread-safe [`DiagnosticSink`] accumulates them across every pipeline
//! stage; a build with any error-severity diagnostics is failed overall even
//! though individual stages ran to completion.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
