//! Mutation-type descriptors, the builders that produce them at startup,
//! and their registration into a dynamic schema.
//!
//! A [`MutationType`] is immutable once built: its derived arguments, caught
//! kinds and body are fixed at declaration time and shared across all
//! invocations. Builders fail fast on programmer errors (no body, an
//! unconvertible form field) instead of deferring them to request time.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputValue, Object, ResolverContext, Schema,
    SchemaBuilder, TypeRef, ValueAccessor,
};
use async_graphql::Value;
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::error;

use crate::context::RequestUser;
use crate::convert::{fields_for_form, FormFieldSpec};
use crate::dispatch::{dispatch, CaughtKinds, FailureKind, MutationFailure};
use crate::form::{FormData, FormFieldDef, FormFieldKind, InstanceStore, MutationForm, StoreError};
use crate::result::{self, MutationResult, MUTATION_ERROR_TYPE};
use crate::{ConfigResult, MutationConfigError};

pub const MUTATION_ROOT_TYPE: &str = "Mutation";

/// Request-scoped inputs handed to a mutation body: the raw arguments and
/// the request user, extracted from the engine context.
#[derive(Clone, Debug)]
pub struct MutationContext {
    args: FormData,
    user: Option<RequestUser>,
}

impl MutationContext {
    pub fn args(&self) -> &FormData {
        &self.args
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// The request user, filtered the same way as [`crate::get_user`].
    pub fn user(&self, allow_anonymous: bool) -> Option<&RequestUser> {
        self.user
            .as_ref()
            .filter(|user| allow_anonymous || !user.anonymous)
    }
}

/// Failures that leave a mutation invocation without a typed result. The
/// engine surfaces them as top-level response errors.
#[derive(Debug, Error)]
pub enum MutationRequestError {
    #[error("{0}")]
    Uncaught(MutationFailure),
    #[error(transparent)]
    Lookup(#[from] StoreError),
    #[error("Mutation {0:?} takes an `id` argument but no instance store is configured")]
    MissingStore(String),
}

/// An extra field on a mutation's payload object, resolved from the values
/// attached to the [`MutationResult`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFieldSpec {
    pub name: String,
    pub type_name: String,
    pub required: bool,
}

impl OutputFieldSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            required: false,
        }
    }

    fn type_ref(&self) -> TypeRef {
        if self.required {
            TypeRef::named_nn(self.type_name.clone())
        } else {
            TypeRef::named(self.type_name.clone())
        }
    }
}

type BodyFuture = BoxFuture<'static, Result<MutationResult, MutationFailure>>;
type MutationBody = Arc<dyn Fn(MutationContext) -> BodyFuture + Send + Sync>;
type FormBody<F> = Arc<dyn Fn(F, MutationContext) -> BodyFuture + Send + Sync>;
type ErasedResolver =
    Arc<dyn Fn(MutationContext) -> BoxFuture<'static, Result<MutationResult, MutationRequestError>> + Send + Sync>;

/// An immutable mutation-type descriptor, ready for registration.
pub struct MutationType {
    name: String,
    payload_type: String,
    description: Option<String>,
    arguments: Vec<FormFieldSpec>,
    outputs: Vec<OutputFieldSpec>,
    resolver: ErasedResolver,
}

impl std::fmt::Debug for MutationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationType")
            .field("name", &self.name)
            .field("payload_type", &self.payload_type)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .field("outputs", &self.outputs)
            .field("resolver", &"<resolver>")
            .finish()
    }
}

impl MutationType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload_type(&self) -> &str {
        &self.payload_type
    }

    /// The derived argument specs, in declaration order.
    pub fn arguments(&self) -> &[FormFieldSpec] {
        &self.arguments
    }

    pub fn outputs(&self) -> &[OutputFieldSpec] {
        &self.outputs
    }

    /// Register this mutation's payload object and root field.
    fn register(self, root: Object, builder: SchemaBuilder) -> (Object, SchemaBuilder) {
        let MutationType {
            name,
            payload_type,
            description,
            arguments,
            outputs,
            resolver,
        } = self;

        let mut payload = Object::new(payload_type.clone())
            .field(success_field())
            .field(error_field());
        for spec in &outputs {
            payload = payload.field(output_field(spec));
        }
        let builder = builder.register(payload);

        let specs = Arc::new(arguments);
        let arg_specs = specs.clone();
        let log_name = name.clone();
        let mut field = Field::new(
            name,
            TypeRef::named_nn(payload_type),
            move |ctx: ResolverContext| {
                let resolver = resolver.clone();
                let specs = specs.clone();
                let log_name = log_name.clone();
                FieldFuture::new(async move {
                    let args = collect_args(&specs, &ctx)?;
                    let user = ctx.data_opt::<RequestUser>().cloned();
                    match resolver(MutationContext { args, user }).await {
                        Ok(mutation_result) => {
                            Ok(Some(FieldValue::owned_any(mutation_result)))
                        }
                        Err(err) => {
                            error!(
                                mutation = %log_name,
                                error = %err,
                                "mutation failure propagated to engine"
                            );
                            Err(async_graphql::Error::new(err.to_string()))
                        }
                    }
                })
            },
        );
        if let Some(description) = description {
            field = field.description(description);
        }
        for spec in arg_specs.iter() {
            field = field.argument(InputValue::new(spec.name.clone(), spec.type_ref()));
        }

        (root.field(field), builder)
    }
}

/// Builder for a mutation with explicitly declared arguments. The body runs
/// inside the dispatch wrapper: classified failures with caught kinds come
/// back as typed results, everything else propagates.
pub struct FailableMutation {
    name: String,
    description: Option<String>,
    payload_type: Option<String>,
    arguments: Vec<FormFieldDef>,
    outputs: Vec<OutputFieldSpec>,
    caught: CaughtKinds,
    body: Option<MutationBody>,
}

impl FailableMutation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            payload_type: None,
            arguments: Vec::new(),
            outputs: Vec::new(),
            caught: CaughtKinds::new(),
            body: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the payload object type name derived from the field name.
    pub fn payload_type(mut self, name: impl Into<String>) -> Self {
        self.payload_type = Some(name.into());
        self
    }

    pub fn argument(mut self, def: FormFieldDef) -> Self {
        self.arguments.push(def);
        self
    }

    /// Declare an extra nullable payload field.
    pub fn output_field(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.outputs.push(OutputFieldSpec::new(name, type_name));
        self
    }

    /// Add a failure kind to the caught set.
    pub fn catch(mut self, kind: FailureKind) -> Self {
        self.caught.insert(kind);
        self
    }

    pub fn resolve<B, Fut>(mut self, body: B) -> Self
    where
        B: Fn(MutationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MutationResult, MutationFailure>> + Send + 'static,
    {
        let erased: MutationBody = Arc::new(move |mc| Box::pin(body(mc)));
        self.body = Some(erased);
        self
    }

    pub fn build(self) -> ConfigResult<MutationType> {
        let FailableMutation {
            name,
            description,
            payload_type,
            arguments,
            outputs,
            caught,
            body,
        } = self;

        let body = match body {
            Some(body) => body,
            None => return Err(MutationConfigError::MissingResolver(name)),
        };
        let arguments = arguments
            .iter()
            .map(crate::convert::convert_form_field)
            .collect::<ConfigResult<Vec<FormFieldSpec>>>()?;

        let resolver: ErasedResolver = Arc::new(move |mc| {
            let body = body.clone();
            let caught = caught.clone();
            Box::pin(async move {
                match body(mc).await {
                    Ok(mutation_result) => Ok(mutation_result),
                    Err(failure) => {
                        dispatch(failure, &caught).map_err(MutationRequestError::Uncaught)
                    }
                }
            })
        });

        Ok(MutationType {
            payload_type: payload_type.unwrap_or_else(|| default_payload_type(&name)),
            name,
            description,
            arguments,
            outputs,
            resolver,
        })
    }
}

/// Builder for a form-backed mutation: arguments are derived from the form's
/// declared fields, input is validated before the body runs, and an `id`
/// argument triggers a record lookup for edit-style calls.
pub struct FormMutation<F: MutationForm> {
    name: String,
    description: Option<String>,
    payload_type: Option<String>,
    only_fields: Vec<String>,
    exclude_fields: Vec<String>,
    outputs: Vec<OutputFieldSpec>,
    caught: CaughtKinds,
    store: Option<Arc<dyn InstanceStore<Instance = F::Instance>>>,
    body: Option<FormBody<F>>,
    form: PhantomData<fn() -> F>,
}

impl<F: MutationForm> FormMutation<F> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            payload_type: None,
            only_fields: Vec::new(),
            exclude_fields: Vec::new(),
            outputs: Vec::new(),
            caught: CaughtKinds::new(),
            store: None,
            body: None,
            form: PhantomData,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn payload_type(mut self, name: impl Into<String>) -> Self {
        self.payload_type = Some(name.into());
        self
    }

    /// Derive arguments only for the named form fields.
    pub fn only_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_fields = names.into_iter().map(Into::into).collect();
        self
    }

    /// Skip the named form fields when deriving arguments.
    pub fn exclude_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_fields = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn output_field(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.outputs.push(OutputFieldSpec::new(name, type_name));
        self
    }

    pub fn catch(mut self, kind: FailureKind) -> Self {
        self.caught.insert(kind);
        self
    }

    /// The store used to resolve the `id` argument to the record being
    /// edited.
    pub fn store(mut self, store: Arc<dyn InstanceStore<Instance = F::Instance>>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn resolve<B, Fut>(mut self, body: B) -> Self
    where
        B: Fn(F, MutationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MutationResult, MutationFailure>> + Send + 'static,
    {
        let erased: FormBody<F> = Arc::new(move |form, mc| Box::pin(body(form, mc)));
        self.body = Some(erased);
        self
    }

    pub fn build(self) -> ConfigResult<MutationType> {
        let FormMutation {
            name,
            description,
            payload_type,
            only_fields,
            exclude_fields,
            outputs,
            caught,
            store,
            body,
            form: _,
        } = self;

        let body = match body {
            Some(body) => body,
            None => return Err(MutationConfigError::MissingResolver(name)),
        };
        // Derived once, at declaration time.
        let arguments = fields_for_form(&F::declared_fields(), &only_fields, &exclude_fields)?;

        let mutation_name = name.clone();
        let resolver: ErasedResolver = Arc::new(move |mut mc| {
            let body = body.clone();
            let caught = caught.clone();
            let store = store.clone();
            let mutation_name = mutation_name.clone();
            Box::pin(async move {
                let instance = match mc.args.shift_remove("id") {
                    Some(pk) => {
                        let pk = primary_key(&pk);
                        if pk.is_empty() {
                            None
                        } else {
                            match store.as_ref() {
                                Some(store) => Some(store.get(&pk).await?),
                                None => {
                                    return Err(MutationRequestError::MissingStore(
                                        mutation_name,
                                    ))
                                }
                            }
                        }
                    }
                    None => None,
                };

                let form = F::bind(mc.args.clone(), instance);
                match form.validate() {
                    Err(errors) => Ok(MutationResult::validation_failed(errors)),
                    Ok(()) => match body(form, mc).await {
                        Ok(mutation_result) => Ok(mutation_result),
                        Err(failure) => {
                            dispatch(failure, &caught).map_err(MutationRequestError::Uncaught)
                        }
                    },
                }
            })
        });

        Ok(MutationType {
            payload_type: payload_type.unwrap_or_else(|| default_payload_type(&name)),
            name,
            description,
            arguments,
            outputs,
            resolver,
        })
    }
}

/// Collects mutation types and registers them, together with the shared
/// error types and the mutation root object, into a dynamic schema.
#[derive(Default)]
pub struct MutationRegistry {
    mutations: Vec<MutationType>,
}

impl MutationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mutation: MutationType) -> ConfigResult<()> {
        if self.mutations.iter().any(|m| m.name == mutation.name) {
            return Err(MutationConfigError::DuplicateMutation(mutation.name));
        }
        self.mutations.push(mutation);
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.mutations.iter().map(|m| m.name()).collect()
    }

    /// Register everything into an existing builder. The builder must have
    /// been created with `Mutation` as its mutation root type name.
    pub fn apply(self, builder: SchemaBuilder) -> SchemaBuilder {
        let builder = result::register_error_types(builder);
        let mut root = Object::new(MUTATION_ROOT_TYPE);
        let mut builder = builder;
        for mutation in self.mutations {
            let (next_root, next_builder) = mutation.register(root, builder);
            root = next_root;
            builder = next_builder;
        }
        builder.register(root)
    }

    /// Convenience for hosts that own no other schema surface: build a
    /// complete schema from the given query root and this registry.
    pub fn build_schema(self, query: Object) -> ConfigResult<Schema> {
        let query_name = query.type_name().to_string();
        let builder = Schema::build(query_name.as_str(), Some(MUTATION_ROOT_TYPE), None)
            .register(query);
        Ok(self.apply(builder).finish()?)
    }
}

fn success_field() -> Field {
    Field::new("success", TypeRef::named_nn(TypeRef::BOOLEAN), |ctx| {
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<MutationResult>()?;
            Ok(Some(FieldValue::value(parent.success())))
        })
    })
}

fn error_field() -> Field {
    Field::new("error", TypeRef::named(MUTATION_ERROR_TYPE), |ctx| {
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<MutationResult>()?;
            match parent.error() {
                None => Ok(None),
                Some(err) => {
                    let member = match err {
                        crate::result::MutationError::Validation(v) => {
                            FieldValue::owned_any(v.clone())
                        }
                        crate::result::MutationError::Execution(e) => {
                            FieldValue::owned_any(e.clone())
                        }
                    };
                    Ok(Some(member.with_type(err.graphql_type())))
                }
            }
        })
    })
}

fn output_field(spec: &OutputFieldSpec) -> Field {
    let name = spec.name.clone();
    Field::new(spec.name.clone(), spec.type_ref(), move |ctx| {
        let name = name.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<MutationResult>()?;
            match parent.value(&name) {
                None | Some(Value::Null) => Ok(None),
                Some(value) => Ok(Some(FieldValue::value(value.clone()))),
            }
        })
    })
}

/// Extract the declared arguments into raw form data. Absent and explicitly
/// null arguments are treated alike: the field is simply not bound.
fn collect_args(
    specs: &[FormFieldSpec],
    ctx: &ResolverContext<'_>,
) -> async_graphql::Result<FormData> {
    let mut data = FormData::default();
    for spec in specs {
        if let Some(accessor) = ctx.args.get(spec.name.as_str()) {
            if accessor.is_null() {
                continue;
            }
            data.insert(spec.name.clone(), arg_value(spec, &accessor)?);
        }
    }
    Ok(data)
}

fn arg_value(
    spec: &FormFieldSpec,
    accessor: &ValueAccessor<'_>,
) -> async_graphql::Result<Value> {
    let value = match &spec.kind {
        FormFieldKind::Char
        | FormFieldKind::Text
        | FormFieldKind::Email
        | FormFieldKind::Url
        | FormFieldKind::Choice(_) => Value::from(accessor.string()?.to_string()),
        FormFieldKind::Id => match accessor.string() {
            Ok(s) => Value::from(s.to_string()),
            // ID literals may also arrive as integers.
            Err(_) => Value::from(accessor.i64()?.to_string()),
        },
        FormFieldKind::Integer => Value::from(accessor.i64()?),
        FormFieldKind::Float => Value::from(accessor.f64()?),
        FormFieldKind::Boolean => Value::from(accessor.boolean()?),
        FormFieldKind::Custom(_) => scalar_value(accessor)?,
    };
    Ok(value)
}

fn scalar_value(accessor: &ValueAccessor<'_>) -> async_graphql::Result<Value> {
    if let Ok(s) = accessor.string() {
        return Ok(Value::from(s.to_string()));
    }
    if let Ok(b) = accessor.boolean() {
        return Ok(Value::from(b));
    }
    if let Ok(n) = accessor.i64() {
        return Ok(Value::from(n));
    }
    if let Ok(f) = accessor.f64() {
        return Ok(Value::from(f));
    }
    Err(async_graphql::Error::new(
        "Unable to parse argument value into string, bool, i64, or f64",
    ))
}

fn primary_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn default_payload_type(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{}Payload", first.to_ascii_uppercase(), chars.as_str()),
        None => "Payload".to_string(),
    }
}
