//! Utility functions for GraphQL execution

use graphql_parser::query::{Directive, Value as GqlValue, VariableDefinition};
use serde_json::{Map, Value, json};

use crate::core::error::BlogError;

/// Convert a GraphQL value to JSON, substituting variables
///
/// A variable that was neither provided nor defaulted reads as null.
pub fn gql_value_to_json(value: &GqlValue<'_, String>, variables: &Map<String, Value>) -> Value {
    match value {
        GqlValue::Null => Value::Null,
        GqlValue::Int(i) => i.as_i64().map(Value::from).unwrap_or(Value::Null),
        GqlValue::Float(f) => json!(f),
        GqlValue::String(s) => json!(s),
        GqlValue::Boolean(b) => json!(b),
        GqlValue::Enum(e) => json!(e),
        GqlValue::List(list) => Value::Array(
            list.iter()
                .map(|item| gql_value_to_json(item, variables))
                .collect(),
        ),
        GqlValue::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), gql_value_to_json(v, variables)))
                .collect(),
        ),
        GqlValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
    }
}

/// Merge provided variables with the defaults declared by the operation
pub fn collect_variables(
    definitions: &[VariableDefinition<'_, String>],
    provided: Option<Map<String, Value>>,
) -> Map<String, Value> {
    let mut variables = provided.unwrap_or_default();
    for definition in definitions {
        if variables.contains_key(&definition.name) {
            continue;
        }
        if let Some(default) = &definition.default_value {
            let value = gql_value_to_json(default, &Map::new());
            variables.insert(definition.name.clone(), value);
        }
    }
    variables
}

/// Evaluate `@skip(if:)` and `@include(if:)`
pub fn is_included(directives: &[Directive<'_, String>], variables: &Map<String, Value>) -> bool {
    let condition = |directive: &Directive<'_, String>| {
        directive
            .arguments
            .iter()
            .find(|(name, _)| name == "if")
            .map(|(_, value)| gql_value_to_json(value, variables))
            .and_then(|value| value.as_bool())
    };

    directives.iter().all(|directive| match directive.name.as_str() {
        "skip" => condition(directive) != Some(true),
        "include" => condition(directive) != Some(false),
        _ => true,
    })
}

/// GraphQL response carrying exactly one error
pub fn error_response(err: &BlogError) -> Value {
    let response = err.to_response();
    let mut extensions = json!({
        "code": response.code,
        "kind": response.kind,
    });
    if let (Some(details), Some(obj)) = (response.details, extensions.as_object_mut()) {
        obj.insert("details".to_string(), details);
    }

    json!({
        "errors": [{
            "message": response.message,
            "extensions": extensions,
        }]
    })
}
