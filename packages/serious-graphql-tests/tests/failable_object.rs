//! The query-side failable wrapper: an existing object type wrapped in a
//! success/error/result envelope.

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputValue, Object, Schema, TypeRef,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use serious_graphql::{failable_object_type, FailableValue};
use serious_graphql_testing::{execute, response_data};

#[derive(Clone, Debug)]
struct CounterValue {
    value: i64,
}

fn counter_type() -> Object {
    Object::new("Counter").field(Field::new(
        "value",
        TypeRef::named_nn(TypeRef::INT),
        |ctx| {
            FieldFuture::new(async move {
                let parent = ctx.parent_value.try_downcast_ref::<CounterValue>()?;
                Ok(Some(FieldValue::value(parent.value)))
            })
        },
    ))
}

fn schema() -> Schema {
    let query = Object::new("Query").field(
        Field::new("counter", TypeRef::named_nn("FailableCounter"), |ctx| {
            FieldFuture::new(async move {
                let ok = ctx.args.try_get("ok")?.boolean()?;
                let wrapped = if ok {
                    FailableValue::ok(CounterValue { value: 42 })
                } else {
                    FailableValue::err("could not load counter")
                };
                Ok(Some(FieldValue::owned_any(wrapped)))
            })
        })
        .argument(InputValue::new("ok", TypeRef::named_nn(TypeRef::BOOLEAN))),
    );

    Schema::build("Query", None, None)
        .register(counter_type())
        .register(failable_object_type::<CounterValue>("Counter"))
        .register(query)
        .finish()
        .expect("test schema builds")
}

#[tokio::test]
async fn test_wrapped_result_resolves_through_the_envelope() {
    let schema = schema();
    let response = execute(
        &schema,
        "{ counter(ok: true) { success error result { value } } }",
        None,
        None,
    )
    .await;
    assert_eq!(
        response_data(&response),
        json!({
            "counter": { "success": true, "error": null, "result": { "value": 42 } }
        })
    );
}

#[tokio::test]
async fn test_wrapped_error_carries_the_message() {
    let schema = schema();
    let response = execute(
        &schema,
        "{ counter(ok: false) { success error result { value } } }",
        None,
        None,
    )
    .await;
    assert_eq!(
        response_data(&response),
        json!({
            "counter": { "success": false, "error": "could not load counter", "result": null }
        })
    );
}
