//! The form-collaborator contract: declared fields, raw input data, and the
//! validation surface this layer reads. Validation semantics belong to the
//! implementations, never to this crate.

use async_graphql_value::ConstValue;
use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;

use crate::result::FieldError;

/// Raw mutation input, keyed by field name in argument order.
pub type FormData = IndexMap<String, ConstValue>;

/// The native field vocabulary a form declares its fields in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormFieldKind {
    Char,
    Text,
    Email,
    Url,
    Integer,
    Float,
    Boolean,
    Id,
    /// A choice among fixed string values. The choices drive form
    /// validation; the argument type is a plain string.
    Choice(Vec<String>),
    /// An explicitly named GraphQL scalar the host has registered.
    Custom(String),
}

/// One declared form field. Fields are required unless marked otherwise,
/// mirroring the usual form-library default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormFieldDef {
    pub name: String,
    pub kind: FormFieldKind,
    pub required: bool,
}

impl FormFieldDef {
    pub fn new(name: impl Into<String>, kind: FormFieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A declarative form: an ordered set of fields plus validation over bound
/// input. Implementations own the validation rules; this layer only binds
/// data and reads the outcome.
pub trait MutationForm: Send + Sync + Sized + 'static {
    /// The record type bound for edit-style mutations.
    type Instance: Clone + Send + Sync + 'static;

    /// The form's fields, in declaration order.
    fn declared_fields() -> Vec<FormFieldDef>;

    /// Bind raw input, and for edit-style calls the instance being edited.
    fn bind(data: FormData, instance: Option<Self::Instance>) -> Self;

    /// Run field-level and whole-form validation. Errors come back in
    /// field-declaration order.
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No record found for primary key {0:?}")]
    NotFound(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// The data-store collaborator for edit-style mutations: resolve a primary
/// key to the record instance a form edits. Lookup failures propagate to the
/// engine as top-level errors rather than typed results.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    type Instance: Clone + Send + Sync + 'static;

    async fn get(&self, pk: &str) -> Result<Self::Instance, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_required_by_default() {
        let field = FormFieldDef::new("name", FormFieldKind::Char);
        assert!(field.required);
        assert!(!FormFieldDef::new("age", FormFieldKind::Integer)
            .optional()
            .required);
    }
}
