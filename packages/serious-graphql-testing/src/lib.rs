//! # serious-graphql-testing
//!
//! Helpers for exercising mutations built with `serious-graphql` in tests:
//! execute a query against a dynamic schema with a request user and
//! variables attached, read mutation payloads out of the response, and
//! assert on the three possible outcomes (successful, errored, threw).

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response, Variables};
use serde_json::Value as JsonValue;

use serious_graphql::RequestUser;

/// Execute a query, attaching the given user and JSON variables to the
/// request the way a host server would.
pub async fn execute(
    schema: &Schema,
    query: &str,
    user: Option<RequestUser>,
    variables: Option<JsonValue>,
) -> Response {
    let mut request = Request::new(query);
    if let Some(variables) = variables {
        request = request.variables(Variables::from_json(variables));
    }
    if let Some(user) = user {
        request = request.data(user);
    }
    schema.execute(request).await
}

/// The response data as JSON. Null when the request threw.
pub fn response_data(response: &Response) -> JsonValue {
    response
        .data
        .clone()
        .into_json()
        .expect("response data is always JSON-representable")
}

/// The payload object of the named mutation.
///
/// Panics with a descriptive message when the response carries no data for
/// that name; that is harness misuse, not a mutation outcome.
pub fn mutation_data(response: &Response, name: &str) -> JsonValue {
    let data = response_data(response);
    match data.get(name) {
        Some(payload) if !payload.is_null() => payload.clone(),
        _ => panic!("could not access data for mutation {name:?} on response {data}"),
    }
}

/// The error carried by a mutation payload, decoded into its variant.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationErrorData {
    Validation(Vec<JsonValue>),
    Execution(String),
}

/// Read the `error` field of the named mutation's payload, if any.
pub fn mutation_error(response: &Response, name: &str) -> Option<MutationErrorData> {
    let error = mutation_data(response, name).get("error").cloned()?;
    if let Some(items) = error.get("validationErrors").and_then(JsonValue::as_array) {
        return Some(MutationErrorData::Validation(items.clone()));
    }
    if let Some(message) = error.get("errorMessage").and_then(JsonValue::as_str) {
        return Some(MutationErrorData::Execution(message.to_string()));
    }
    None
}

/// Assert the named mutation executed successfully: `success` is true and
/// `error` is null.
pub fn assert_successful(response: &Response, name: &str) {
    assert!(
        response.errors.is_empty(),
        "expected a successful mutation, got top-level errors: {:?}",
        response.errors
    );
    let payload = mutation_data(response, name);
    assert_eq!(
        payload.get("success"),
        Some(&JsonValue::Bool(true)),
        "expected success on payload {payload}"
    );
    assert_eq!(
        mutation_error(response, name),
        None,
        "expected no error on payload {payload}"
    );
}

/// Assert the named mutation executed and reported a typed error:
/// `success` is false and `error` is present.
pub fn assert_errored(response: &Response, name: &str) {
    let payload = mutation_data(response, name);
    assert_eq!(
        payload.get("success"),
        Some(&JsonValue::Bool(false)),
        "expected failure on payload {payload}"
    );
    assert!(
        mutation_error(response, name).is_some(),
        "expected an error on payload {payload}"
    );
}

/// Assert the request threw: no data, and at least one top-level error.
pub fn assert_threw(response: &Response) {
    assert!(
        response_data(response).is_null(),
        "expected null data, got {}",
        response_data(response)
    );
    assert!(
        !response.errors.is_empty(),
        "expected top-level errors on the response"
    );
}
