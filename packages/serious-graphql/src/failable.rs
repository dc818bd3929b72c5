//! A lightweight failable wrapper around an existing output type, for
//! query-side use where the full mutation error union is overkill: the
//! wrapper carries a success flag, an optional error message, and the
//! wrapped result.

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, TypeRef};

/// The resolved value behind a failable wrapper object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailableValue<T> {
    success: bool,
    error: Option<String>,
    result: Option<T>,
}

impl<T> FailableValue<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            error: None,
            result: Some(result),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            result: None,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }
}

/// Build the wrapper object type for `inner_type`, named `Failable<inner>`.
///
/// `T` is the Rust value backing the wrapped type's own field resolvers; the
/// wrapper's `result` field hands it to them as the parent value.
pub fn failable_object_type<T: Send + Sync + 'static>(inner_type: &str) -> Object {
    failable_object_type_named::<T>(inner_type, &format!("Failable{inner_type}"))
}

/// Like [`failable_object_type`], with an explicit wrapper type name.
pub fn failable_object_type_named<T: Send + Sync + 'static>(
    inner_type: &str,
    name: &str,
) -> Object {
    Object::new(name)
        .field(Field::new(
            "success",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            |ctx| {
                FieldFuture::new(async move {
                    let parent = ctx.parent_value.try_downcast_ref::<FailableValue<T>>()?;
                    Ok(Some(FieldValue::value(parent.success)))
                })
            },
        ))
        .field(Field::new(
            "error",
            TypeRef::named(TypeRef::STRING),
            |ctx| {
                FieldFuture::new(async move {
                    let parent = ctx.parent_value.try_downcast_ref::<FailableValue<T>>()?;
                    match &parent.error {
                        Some(message) => Ok(Some(FieldValue::value(message.clone()))),
                        None => Ok(None),
                    }
                })
            },
        ))
        .field(Field::new(
            "result",
            TypeRef::named(inner_type),
            |ctx| {
                FieldFuture::new(async move {
                    let parent = ctx.parent_value.try_downcast_ref::<FailableValue<T>>()?;
                    match &parent.result {
                        Some(result) => Ok(Some(FieldValue::borrowed_any(result))),
                        None => Ok(None),
                    }
                })
            },
        ))
}
