//! Failure classification and the dispatch step that turns classified
//! failures into typed results.
//!
//! Mutation bodies do not report errors through open-ended exception types.
//! They classify failures into a closed set of [`FailureKind`] tags; each
//! mutation type declares which kinds it converts into an `ExecutionError`
//! result, and everything else propagates to the engine untouched.

use thiserror::Error;
use tracing::debug;

use crate::result::{FieldError, MutationResult};

/// A tag naming one kind of mutation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FailureKind(&'static str);

impl FailureKind {
    /// The built-in kind raised for ordinary business-logic failures. It is
    /// a member of every [`CaughtKinds`] built by [`CaughtKinds::new`].
    pub const EXECUTION: FailureKind = FailureKind::new("execution");

    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    pub fn tag(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// The ordered set of failure kinds a mutation type converts into an
/// `ExecutionError` result instead of propagating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaughtKinds(Vec<FailureKind>);

impl CaughtKinds {
    /// The default set: only [`FailureKind::EXECUTION`].
    pub fn new() -> Self {
        Self(vec![FailureKind::EXECUTION])
    }

    /// An empty set; every execution failure propagates.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, kind: FailureKind) {
        if !self.0.contains(&kind) {
            self.0.push(kind);
        }
    }

    pub fn contains(&self, kind: FailureKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FailureKind> {
        self.0.iter()
    }
}

impl Default for CaughtKinds {
    fn default() -> Self {
        Self::new()
    }
}

/// A failure returned by a mutation body.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MutationFailure {
    /// Input failed validation rules; carries per-field messages in order.
    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldError>),
    /// A classified execution failure. The message is what a caller sees,
    /// whether the kind is caught or propagated.
    #[error("{message}")]
    Execution {
        kind: FailureKind,
        message: String,
    },
}

impl MutationFailure {
    /// A failure of the built-in execution kind.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            kind: FailureKind::EXECUTION,
            message: message.into(),
        }
    }

    /// A failure of a caller-defined kind.
    pub fn of_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Execution {
            kind,
            message: message.into(),
        }
    }

    /// A validation failure over the given field errors.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

/// Convert a classified failure into a typed result, or hand it back for the
/// engine to surface.
///
/// Validation failures always become the `ValidationErrors` variant; they are
/// checked before the allow-list so they can never come out as an
/// `ExecutionError`. Execution failures become `ExecutionError` when their
/// kind is in `caught`, and are returned unchanged otherwise.
pub fn dispatch(
    failure: MutationFailure,
    caught: &CaughtKinds,
) -> Result<MutationResult, MutationFailure> {
    match failure {
        MutationFailure::Validation(errors) => {
            debug!(fields = errors.len(), "mutation input failed validation");
            Ok(MutationResult::validation_failed(errors))
        }
        MutationFailure::Execution { kind, message } if caught.contains(kind) => {
            debug!(kind = %kind, "mutation failure caught as execution error");
            Ok(MutationResult::execution_failed(message))
        }
        other => Err(other),
    }
}
