//! Shared fixtures: test forms, an in-memory record store, and schema
//! assembly helpers.

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, Schema, TypeRef};
use async_graphql::Value;
use async_trait::async_trait;

use serious_graphql::{
    FieldError, FormData, FormFieldDef, FormFieldKind, InstanceStore, MutationForm,
    MutationRegistry, StoreError,
};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_EMAIL_MESSAGE: &str = "Enter a valid email address.";

/// Invocation counter handed into mutation bodies by the test that owns it.
pub type CallCounter = Arc<AtomicUsize>;

pub fn call_counter() -> CallCounter {
    Arc::new(AtomicUsize::new(0))
}

fn str_field<'a>(data: &'a FormData, name: &str) -> Option<&'a str> {
    match data.get(name) {
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn int_field(data: &FormData, name: &str) -> Option<i64> {
    match data.get(name) {
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
}

/// A signup form: `name` and `email` required, `age` optional.
pub struct SignupForm {
    data: FormData,
}

impl SignupForm {
    pub fn name(&self) -> &str {
        str_field(&self.data, "name").unwrap_or_default()
    }

    pub fn email(&self) -> &str {
        str_field(&self.data, "email").unwrap_or_default()
    }

    pub fn age(&self) -> Option<i64> {
        int_field(&self.data, "age")
    }
}

impl MutationForm for SignupForm {
    type Instance = ();

    fn declared_fields() -> Vec<FormFieldDef> {
        vec![
            FormFieldDef::new("name", FormFieldKind::Char),
            FormFieldDef::new("email", FormFieldKind::Email),
            FormFieldDef::new("age", FormFieldKind::Integer).optional(),
        ]
    }

    fn bind(data: FormData, _instance: Option<()>) -> Self {
        Self { data }
    }

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name().trim().is_empty() {
            errors.push(FieldError::single("name", REQUIRED_MESSAGE));
        }
        let email = self.email();
        if email.trim().is_empty() {
            errors.push(FieldError::single("email", REQUIRED_MESSAGE));
        } else if !email.contains('@') {
            errors.push(FieldError::single("email", INVALID_EMAIL_MESSAGE));
        }
        if let Some(age) = self.age() {
            if age < 0 {
                errors.push(FieldError::single(
                    "age",
                    "Ensure this value is greater than or equal to 0.",
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// The record type edited through [`UpdateUserForm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
}

/// An edit form over [`UserRecord`]: the `id` argument selects the record,
/// `name` is the edited value.
pub struct UpdateUserForm {
    data: FormData,
    instance: Option<UserRecord>,
}

impl UpdateUserForm {
    pub fn name(&self) -> &str {
        str_field(&self.data, "name").unwrap_or_default()
    }

    pub fn instance(&self) -> Option<&UserRecord> {
        self.instance.as_ref()
    }
}

impl MutationForm for UpdateUserForm {
    type Instance = UserRecord;

    fn declared_fields() -> Vec<FormFieldDef> {
        vec![
            FormFieldDef::new("id", FormFieldKind::Id),
            FormFieldDef::new("name", FormFieldKind::Char),
        ]
    }

    fn bind(data: FormData, instance: Option<UserRecord>) -> Self {
        Self { data, instance }
    }

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        if self.name().trim().is_empty() {
            Err(vec![FieldError::single("name", REQUIRED_MESSAGE)])
        } else {
            Ok(())
        }
    }
}

/// An in-memory store of user records keyed by primary key.
pub struct MemoryUserStore {
    users: HashMap<String, UserRecord>,
}

impl MemoryUserStore {
    pub fn with_users(users: Vec<UserRecord>) -> Arc<Self> {
        let users = users
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect::<HashMap<_, _>>();
        Arc::new(Self { users })
    }
}

#[async_trait]
impl InstanceStore for MemoryUserStore {
    type Instance = UserRecord;

    async fn get(&self, pk: &str) -> Result<UserRecord, StoreError> {
        self.users
            .get(pk)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(pk.to_string()))
    }
}

/// A minimal query root; dynamic schemas always need one.
pub fn query_root() -> Object {
    Object::new("Query").field(Field::new(
        "ping",
        TypeRef::named_nn(TypeRef::STRING),
        |_ctx| FieldFuture::new(async move { Ok(Some(FieldValue::value("pong"))) }),
    ))
}

/// Build a complete schema from the registry and the stub query root.
pub fn schema_for(registry: MutationRegistry) -> Schema {
    registry
        .build_schema(query_root())
        .expect("test schema builds")
}

/// The error selection used by every mutation query in the suite.
pub const ERROR_SELECTION: &str = "error { \
     ... on ValidationErrors { validationErrors { field messages } } \
     ... on ExecutionError { errorMessage } }";
