//! Closure lifting core.
//!
//! This crate turns closure literals into named holder classes: a class with
//! one field per captured variable and a single `invoke` method carrying the
//! closure body, plus an instantiation and field assignments at the original
//! site, so every call site keeps working while no anonymous function
//! remains.
//!
//! The passes run in a fixed order over one document:
//! 1. [`discover`] classifies nodes and yields closure sites in document
//!    order.
//! 2. [`capture`] resolves each site's free variables and rejects
//!    instance-bound captures.
//! 3. [`synth`] builds the holder class for a site.
//! 4. [`rewrite`] places the instantiation, field assignments, and call-site
//!    replacement.
//! 5. [`pipeline`] orchestrates the above and commits all edits atomically.
//!
//! The core is defined entirely against the [`SemanticDocument`] capability
//! trait; it depends on no parser. The production front end wraps a real
//! TypeScript parser, while unit tests construct documents by hand.

pub mod capture;
pub mod discover;
pub mod error;
pub mod model;
pub mod names;
pub mod pipeline;
pub mod rewrite;
pub mod synth;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::LiftError;
pub use model::{
    BindingKind, BodyForm, CaptureEntry, CaptureSet, ClosureBody, ClosureSite, Field,
    HolderType, InboundBinding, Method, MethodBody, NodeId, NodeKind, Param, ReturnType,
    SemanticDocument, Signature, SiteTransformation, TransformationPlan, TypeRef,
    METHOD_NAME,
};
pub use names::NameAllocator;
pub use pipeline::{plan, run, Outcome};
