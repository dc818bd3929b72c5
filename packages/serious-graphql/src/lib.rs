//! # serious-graphql
//!
//! `serious-graphql` standardizes how mutations built on `async_graphql`'s
//! dynamic schema report success and failure. Every mutation returns a
//! payload with a non-null `success` flag and a nullable `error` union
//! (`ValidationErrors | ExecutionError`); mutation bodies signal failure by
//! returning a classified [`MutationFailure`], which is dispatched against
//! the mutation type's allow-list of caught kinds. Form-backed mutations
//! derive their typed arguments from declared form fields at startup and
//! validate input before the body ever runs.

pub mod context;
pub mod convert;
pub mod dispatch;
pub mod failable;
pub mod form;
pub mod mutation;
pub mod result;

use thiserror::Error;

pub use async_graphql::Value;

pub use context::{get_user, RequestUser};
pub use convert::{convert_form_field, fields_for_form, FormFieldSpec};
pub use dispatch::{dispatch, CaughtKinds, FailureKind, MutationFailure};
pub use failable::{failable_object_type, failable_object_type_named, FailableValue};
pub use form::{
    FormData, FormFieldDef, FormFieldKind, InstanceStore, MutationForm, StoreError,
};
pub use mutation::{
    FailableMutation, FormMutation, MutationContext, MutationRegistry,
    MutationRequestError, MutationType, OutputFieldSpec, MUTATION_ROOT_TYPE,
};
pub use result::{
    ExecutionError, FieldError, MutationError, MutationResult, ValidationErrors,
};

pub type ConfigResult<T> = Result<T, MutationConfigError>;

/// Programmer errors in mutation-type configuration. These surface when a
/// mutation type is built or registered, never as a `MutationResult`.
#[derive(Debug, Error)]
pub enum MutationConfigError {
    #[error("Mutation {0:?} has no body; supply one with `resolve` before `build`")]
    MissingResolver(String),
    #[error("Field {field:?} cannot be converted to an argument type: {type_name:?}")]
    UnconvertibleField { field: String, type_name: String },
    #[error("A mutation named {0:?} is already registered")]
    DuplicateMutation(String),
    #[error("Error building dynamic schema: {0:?}")]
    DynamicSchemaBuildError(#[from] async_graphql::dynamic::SchemaError),
}
