//! Scenarios for mutations with explicitly declared arguments: body
//! invocation, caught and uncaught failure kinds, and the wire shape of
//! typed errors.

use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;
use serde_json::json;

use serious_graphql::{
    FailableMutation, FailureKind, FieldError, FormFieldDef, FormFieldKind,
    MutationConfigError, MutationFailure, MutationRegistry, MutationResult, RequestUser,
    Value,
};
use serious_graphql_testing::{
    assert_errored, assert_successful, assert_threw, execute, mutation_data,
    mutation_error, response_data, MutationErrorData,
};
use serious_graphql_tests::fixtures::{call_counter, schema_for, ERROR_SELECTION};

const SOME_KIND: FailureKind = FailureKind::new("some");
const OTHER_KIND: FailureKind = FailureKind::new("other");

fn registry_with(mutation: serious_graphql::MutationType) -> MutationRegistry {
    let mut registry = MutationRegistry::new();
    registry.add(mutation).unwrap();
    registry
}

#[test]
fn test_build_fails_without_body() {
    let err = FailableMutation::new("doThing")
        .output_field("someResult", "Int")
        .build()
        .unwrap_err();
    assert!(matches!(err, MutationConfigError::MissingResolver(name) if name == "doThing"));
}

#[tokio::test]
async fn test_body_runs_once_per_invocation() {
    let calls = call_counter();
    let counter = calls.clone();
    let mutation = FailableMutation::new("doThing")
        .output_field("someResult", "Int")
        .resolve(move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(MutationResult::ok().with_value("someResult", 42))
            }
        })
        .build()
        .unwrap();
    let schema = schema_for(registry_with(mutation));

    let query = format!("mutation {{ doThing {{ success {ERROR_SELECTION} someResult }} }}");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let response = execute(&schema, &query, None, None).await;
    assert_successful(&response, "doThing");
    assert_eq!(mutation_data(&response, "doThing")["someResult"], json!(42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    execute(&schema, &query, None, None).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_declared_kinds_are_caught_others_are_not() {
    let mutation = FailableMutation::new("doThing")
        .argument(FormFieldDef::new("value", FormFieldKind::Integer).optional())
        .output_field("someResult", "Int")
        .catch(SOME_KIND)
        .resolve(|ctx| async move {
            let value = match ctx.arg("value") {
                Some(Value::Number(n)) => n.as_i64(),
                _ => None,
            };
            match value {
                None => Err(MutationFailure::of_kind(SOME_KIND, "oh no!")),
                Some(69) => Err(MutationFailure::of_kind(OTHER_KIND, "nice")),
                Some(value) => Ok(MutationResult::ok().with_value("someResult", value)),
            }
        })
        .build()
        .unwrap();
    let schema = schema_for(registry_with(mutation));

    // A caught kind comes back as a typed execution error.
    let query = format!("mutation {{ doThing {{ success {ERROR_SELECTION} someResult }} }}");
    let response = execute(&schema, &query, None, None).await;
    assert_errored(&response, "doThing");
    assert_eq!(
        mutation_error(&response, "doThing"),
        Some(MutationErrorData::Execution("oh no!".to_string()))
    );

    // No failure at all: a plain successful result.
    let query =
        format!("mutation {{ doThing(value: 100) {{ success {ERROR_SELECTION} someResult }} }}");
    let response = execute(&schema, &query, None, None).await;
    assert_successful(&response, "doThing");
    assert_eq!(mutation_data(&response, "doThing")["someResult"], json!(100));

    // An undeclared kind propagates to the engine with its message intact.
    let query =
        format!("mutation {{ doThing(value: 69) {{ success {ERROR_SELECTION} someResult }} }}");
    let response = execute(&schema, &query, None, None).await;
    assert_threw(&response);
    assert_eq!(response.errors[0].message, "nice");
}

#[tokio::test]
async fn test_validation_failure_wire_shape() {
    let mutation = FailableMutation::new("failThing")
        .resolve(|_ctx| async {
            Err(MutationFailure::validation(vec![FieldError::single(
                "name", "required",
            )]))
        })
        .build()
        .unwrap();
    let schema = schema_for(registry_with(mutation));

    let query = format!("mutation {{ failThing {{ success {ERROR_SELECTION} }} }}");
    let response = execute(&schema, &query, None, None).await;
    assert_eq!(
        response_data(&response),
        json!({
            "failThing": {
                "success": false,
                "error": {
                    "validationErrors": [
                        { "field": "name", "messages": ["required"] }
                    ]
                }
            }
        })
    );
}

#[tokio::test]
async fn test_request_user_is_read_from_the_context() {
    let mutation = FailableMutation::new("whoAmI")
        .output_field("username", "String")
        .resolve(|ctx| async move {
            match ctx.user(false) {
                Some(user) => {
                    Ok(MutationResult::ok().with_value("username", user.username.clone()))
                }
                None => Err(MutationFailure::execution("Not signed in")),
            }
        })
        .build()
        .unwrap();
    let schema = schema_for(registry_with(mutation));
    let query = format!("mutation {{ whoAmI {{ success {ERROR_SELECTION} username }} }}");

    let response = execute(
        &schema,
        &query,
        Some(RequestUser::authenticated("1", "ada")),
        None,
    )
    .await;
    assert_successful(&response, "whoAmI");
    assert_eq!(mutation_data(&response, "whoAmI")["username"], json!("ada"));

    // The anonymous marker does not count as a signed-in user.
    let response = execute(&schema, &query, Some(RequestUser::anonymous()), None).await;
    assert_errored(&response, "whoAmI");
    assert_eq!(
        mutation_error(&response, "whoAmI"),
        Some(MutationErrorData::Execution("Not signed in".to_string()))
    );

    let response = execute(&schema, &query, None, None).await;
    assert_errored(&response, "whoAmI");
}
