//! Conversion of declared form fields into GraphQL argument specs, and the
//! only/exclude filtering applied when a form backs a mutation.

use async_graphql::dynamic::TypeRef;

use crate::form::{FormFieldDef, FormFieldKind};
use crate::{ConfigResult, MutationConfigError};

/// A derived mutation argument: computed once when the mutation type is
/// built, immutable and shared across invocations afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormFieldSpec {
    pub name: String,
    pub type_name: String,
    pub required: bool,
    pub kind: FormFieldKind,
}

impl FormFieldSpec {
    pub fn type_ref(&self) -> TypeRef {
        if self.required {
            TypeRef::named_nn(self.type_name.clone())
        } else {
            TypeRef::named(self.type_name.clone())
        }
    }
}

/// Convert one declared field into an argument spec. Unconvertible fields
/// are configuration errors raised while the mutation type is being built.
pub fn convert_form_field(def: &FormFieldDef) -> ConfigResult<FormFieldSpec> {
    let type_name = match &def.kind {
        FormFieldKind::Char
        | FormFieldKind::Text
        | FormFieldKind::Email
        | FormFieldKind::Url
        | FormFieldKind::Choice(_) => TypeRef::STRING.to_string(),
        FormFieldKind::Integer => TypeRef::INT.to_string(),
        FormFieldKind::Float => TypeRef::FLOAT.to_string(),
        FormFieldKind::Boolean => TypeRef::BOOLEAN.to_string(),
        FormFieldKind::Id => TypeRef::ID.to_string(),
        FormFieldKind::Custom(name) => {
            if !is_valid_graphql_name(name) {
                return Err(MutationConfigError::UnconvertibleField {
                    field: def.name.clone(),
                    type_name: name.clone(),
                });
            }
            name.clone()
        }
    };

    Ok(FormFieldSpec {
        name: def.name.clone(),
        type_name,
        required: def.required,
        kind: def.kind.clone(),
    })
}

/// Derive the argument specs for a form's fields, in declaration order.
///
/// A field is skipped when `only_fields` is non-empty and does not contain
/// its name, or when `exclude_fields` contains its name.
pub fn fields_for_form(
    fields: &[FormFieldDef],
    only_fields: &[String],
    exclude_fields: &[String],
) -> ConfigResult<Vec<FormFieldSpec>> {
    let mut specs = Vec::with_capacity(fields.len());
    for field in fields {
        let is_not_in_only =
            !only_fields.is_empty() && !only_fields.contains(&field.name);
        let is_excluded = exclude_fields.contains(&field.name);
        if is_not_in_only || is_excluded {
            continue;
        }
        specs.push(convert_form_field(field)?);
    }
    Ok(specs)
}

fn is_valid_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
