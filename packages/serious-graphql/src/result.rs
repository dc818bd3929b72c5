//! The uniform result shape every mutation resolves to, and the shared
//! error union it carries.

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, Object, SchemaBuilder, TypeRef, Union,
};
use async_graphql::Value;
use indexmap::IndexMap;

pub const VALIDATION_ERROR_TYPE: &str = "ValidationError";
pub const VALIDATION_ERRORS_TYPE: &str = "ValidationErrors";
pub const EXECUTION_ERROR_TYPE: &str = "ExecutionError";
pub const MUTATION_ERROR_TYPE: &str = "MutationError";

/// One invalid field and the messages collected for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            field: field.into(),
            messages,
        }
    }

    /// A field error carrying a single message.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, vec![message.into()])
    }
}

/// Per-field validation errors, in field-declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub validation_errors: Vec<FieldError>,
}

/// A caught business-logic failure, carrying its message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionError {
    pub error_message: String,
}

/// The error union attached to failed mutation results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationError {
    Validation(ValidationErrors),
    Execution(ExecutionError),
}

impl MutationError {
    /// The GraphQL object type name of this union member.
    pub fn graphql_type(&self) -> &'static str {
        match self {
            MutationError::Validation(_) => VALIDATION_ERRORS_TYPE,
            MutationError::Execution(_) => EXECUTION_ERROR_TYPE,
        }
    }
}

/// What a mutation resolves to: a success flag, an optional error, and any
/// extra payload field values the mutation type declares.
///
/// `success == error.is_none()` holds for every value of this type; the
/// constructors are the only way to build one, so inconsistent results are
/// unrepresentable.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationResult {
    success: bool,
    error: Option<MutationError>,
    values: IndexMap<String, Value>,
}

impl MutationResult {
    /// A successful result with no extra payload values.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            values: IndexMap::new(),
        }
    }

    /// A failed result carrying the given error.
    pub fn from_error(error: MutationError) -> Self {
        Self {
            success: false,
            error: Some(error),
            values: IndexMap::new(),
        }
    }

    /// A failed result from per-field validation errors, preserving their
    /// order.
    pub fn validation_failed(errors: Vec<FieldError>) -> Self {
        Self::from_error(MutationError::Validation(ValidationErrors {
            validation_errors: errors,
        }))
    }

    /// A failed result from a caught execution failure.
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::from_error(MutationError::Execution(ExecutionError {
            error_message: message.into(),
        }))
    }

    /// Attach an extra payload field value.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&MutationError> {
        self.error.as_ref()
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Register the shared error types into a dynamic schema. Called once per
/// schema by [`crate::MutationRegistry::apply`].
pub(crate) fn register_error_types(builder: SchemaBuilder) -> SchemaBuilder {
    let field_error = Object::new(VALIDATION_ERROR_TYPE)
        .field(Field::new(
            "field",
            TypeRef::named(TypeRef::STRING),
            |ctx| {
                FieldFuture::new(async move {
                    let parent = ctx.parent_value.try_downcast_ref::<FieldError>()?;
                    Ok(Some(FieldValue::value(parent.field.clone())))
                })
            },
        ))
        .field(Field::new(
            "messages",
            TypeRef::named_list(TypeRef::STRING),
            |ctx| {
                FieldFuture::new(async move {
                    let parent = ctx.parent_value.try_downcast_ref::<FieldError>()?;
                    let messages = parent
                        .messages
                        .iter()
                        .cloned()
                        .map(Value::from)
                        .collect::<Vec<Value>>();
                    Ok(Some(FieldValue::value(Value::List(messages))))
                })
            },
        ));

    let validation_errors = Object::new(VALIDATION_ERRORS_TYPE).field(Field::new(
        "validationErrors",
        TypeRef::named_list(VALIDATION_ERROR_TYPE),
        |ctx| {
            FieldFuture::new(async move {
                let parent = ctx.parent_value.try_downcast_ref::<ValidationErrors>()?;
                let items = parent
                    .validation_errors
                    .iter()
                    .map(|e| FieldValue::owned_any(e.clone()))
                    .collect::<Vec<FieldValue>>();
                Ok(Some(FieldValue::list(items)))
            })
        },
    ));

    let execution_error = Object::new(EXECUTION_ERROR_TYPE).field(Field::new(
        "errorMessage",
        TypeRef::named_nn(TypeRef::STRING),
        |ctx| {
            FieldFuture::new(async move {
                let parent = ctx.parent_value.try_downcast_ref::<ExecutionError>()?;
                Ok(Some(FieldValue::value(parent.error_message.clone())))
            })
        },
    ));

    let mutation_error = Union::new(MUTATION_ERROR_TYPE)
        .possible_type(VALIDATION_ERRORS_TYPE)
        .possible_type(EXECUTION_ERROR_TYPE);

    builder
        .register(field_error)
        .register(validation_errors)
        .register(execution_error)
        .register(mutation_error)
}
