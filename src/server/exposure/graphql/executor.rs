//! GraphQL document execution
//!
//! Translates a parsed document into one [`OperationRequest`] per root
//! field and runs them through the host's executor. Fragment spreads and
//! inline fragments are expanded into the selection tree, variables are
//! substituted into arguments, and aliases become response keys.

use graphql_parser::query::{
    Definition, Document, Field, FragmentDefinition, OperationDefinition, Selection, parse_query,
};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::utils::{collect_variables, error_response, gql_value_to_json, is_included};
use crate::core::error::{BlogResult, RequestError};
use crate::core::schema::TYPENAME_FIELD;
use crate::core::selection::{FieldSelection, OperationRequest};
use crate::server::host::ServerHost;

type Fragments<'a, 'q> = HashMap<&'a str, &'a FragmentDefinition<'q, String>>;

/// GraphQL executor bound to a server host
pub struct GraphQLExecutor {
    host: Arc<ServerHost>,
}

impl GraphQLExecutor {
    pub fn new(host: Arc<ServerHost>) -> Self {
        Self { host }
    }

    /// Execute a GraphQL document and return the response envelope
    ///
    /// The result is either `{"data": {...}}` or `{"errors": [..]}` with a
    /// single error; a failing root field discards the whole response. A
    /// mutation operation selects at most one root field, so a reported
    /// error never hides a committed write.
    pub fn execute(
        &self,
        query: &str,
        variables: Option<Map<String, Value>>,
        operation_name: Option<&str>,
    ) -> Value {
        match self.execute_document(query, variables, operation_name) {
            Ok(data) => json!({ "data": data }),
            Err(e) => {
                tracing::debug!(code = e.error_code(), error = %e, "GraphQL request failed");
                error_response(&e)
            }
        }
    }

    fn execute_document(
        &self,
        query: &str,
        variables: Option<Map<String, Value>>,
        operation_name: Option<&str>,
    ) -> BlogResult<Value> {
        let doc = parse_query::<String>(query).map_err(|e| RequestError::Parse {
            message: e.to_string(),
        })?;

        let fragments = collect_fragments(&doc)?;
        let operation = select_operation(&doc, operation_name)?;

        let (selection_set, definitions, is_mutation) = match operation {
            OperationDefinition::Query(query) => {
                (&query.selection_set, query.variable_definitions.as_slice(), false)
            }
            OperationDefinition::Mutation(mutation) => {
                (&mutation.selection_set, mutation.variable_definitions.as_slice(), true)
            }
            OperationDefinition::SelectionSet(selection_set) => {
                (selection_set, &[][..], false)
            }
            OperationDefinition::Subscription(_) => {
                return Err(RequestError::Unsupported {
                    message: "Subscriptions are not supported".to_string(),
                }
                .into());
            }
        };

        let variables = collect_variables(definitions, variables);
        let mut roots = Vec::new();
        flatten_fields(&selection_set.items, &fragments, &variables, &mut roots)?;

        // `None` stands for the root `__typename`
        let mut planned: Vec<(String, Option<OperationRequest>)> = Vec::with_capacity(roots.len());
        for field in roots {
            let key = field.alias.as_ref().unwrap_or(&field.name).clone();

            if field.name == TYPENAME_FIELD {
                planned.push((key, None));
                continue;
            }

            let declared = self.host.schema.operation(&field.name);
            if declared.is_some_and(|op| op.is_mutation() != is_mutation) {
                return Err(RequestError::UnknownOperation {
                    name: field.name.clone(),
                }
                .into());
            }

            let request = OperationRequest {
                operation: field.name.clone(),
                arguments: field
                    .arguments
                    .iter()
                    .map(|(name, value)| (name.clone(), gql_value_to_json(value, &variables)))
                    .collect(),
                selection: build_selection(&field.selection_set.items, &fragments, &variables)?,
            };

            planned.push((key, Some(request)));
        }
        check_root_fields(&planned, is_mutation)?;

        let mut data = Map::new();
        for (key, request) in planned {
            let value = match request {
                Some(request) => self.host.executor.execute(&request)?,
                None if is_mutation => json!("Mutation"),
                None => json!("Query"),
            };
            data.insert(key, value);
        }

        Ok(Value::Object(data))
    }
}

/// Reject root selections that cannot be answered as one consistent result
fn check_root_fields(
    planned: &[(String, Option<OperationRequest>)],
    is_mutation: bool,
) -> BlogResult<()> {
    let operations = planned.iter().filter(|(_, request)| request.is_some()).count();
    if is_mutation && operations > 1 {
        return Err(RequestError::Unsupported {
            message: "A mutation operation may select at most one root field".to_string(),
        }
        .into());
    }

    let mut seen: HashMap<&str, &Option<OperationRequest>> = HashMap::new();
    for (key, request) in planned {
        if let Some(previous) = seen.insert(key.as_str(), request)
            && previous != request
        {
            return Err(RequestError::Unsupported {
                message: format!("Root fields conflict on response key '{}'", key),
            }
            .into());
        }
    }
    Ok(())
}

/// Index the document's fragments, rejecting any spread cycle
fn collect_fragments<'a, 'q>(doc: &'a Document<'q, String>) -> BlogResult<Fragments<'a, 'q>> {
    let fragments: Fragments<'a, 'q> = doc
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
            Definition::Operation(_) => None,
        })
        .collect();

    let mut done = HashSet::new();
    for name in fragments.keys().copied() {
        visit_fragment(name, &fragments, &mut Vec::new(), &mut done)?;
    }
    Ok(fragments)
}

/// Depth-first walk of the spread graph; a name already on the path is a cycle
fn visit_fragment<'a, 'q>(
    name: &'a str,
    fragments: &Fragments<'a, 'q>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
) -> BlogResult<()> {
    if done.contains(name) {
        return Ok(());
    }
    if path.contains(&name) {
        return Err(RequestError::Parse {
            message: format!("Fragment '{}' spreads itself", name),
        }
        .into());
    }
    // Unknown names are reported when the selection is expanded
    let Some(fragment) = fragments.get(name).copied() else {
        return Ok(());
    };

    let mut spreads = Vec::new();
    spreads_of(&fragment.selection_set.items, &mut spreads);

    path.push(name);
    for spread in spreads {
        visit_fragment(spread, fragments, path, done)?;
    }
    path.pop();
    done.insert(name);
    Ok(())
}

/// Every fragment spread in a selection set, at any depth
fn spreads_of<'a>(items: &'a [Selection<'_, String>], out: &mut Vec<&'a str>) {
    for item in items {
        match item {
            Selection::Field(field) => spreads_of(&field.selection_set.items, out),
            Selection::InlineFragment(inline) => spreads_of(&inline.selection_set.items, out),
            Selection::FragmentSpread(spread) => out.push(spread.fragment_name.as_str()),
        }
    }
}

/// Pick the operation to run: the named one, or the only one
fn select_operation<'a, 'q>(
    doc: &'a Document<'q, String>,
    operation_name: Option<&str>,
) -> BlogResult<&'a OperationDefinition<'q, String>> {
    let operations: Vec<&OperationDefinition<'q, String>> = doc
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        })
        .collect();

    if let Some(name) = operation_name {
        return operations
            .into_iter()
            .find(|operation| operation_name_of(operation) == Some(name))
            .ok_or_else(|| {
                RequestError::OperationNotFound {
                    name: name.to_string(),
                }
                .into()
            });
    }

    match operations.as_slice() {
        [operation] => Ok(*operation),
        [] => Err(RequestError::Parse {
            message: "Document contains no operation".to_string(),
        }
        .into()),
        _ => Err(RequestError::Unsupported {
            message: "operationName is required when the document contains several operations"
                .to_string(),
        }
        .into()),
    }
}

fn operation_name_of<'a>(operation: &'a OperationDefinition<'_, String>) -> Option<&'a str> {
    match operation {
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
        OperationDefinition::SelectionSet(_) => None,
    }
}

/// Collect the fields of a selection set, expanding fragments in place
///
/// Fragments have been checked for cycles by [`collect_fragments`].
fn flatten_fields<'a, 'q>(
    items: &'a [Selection<'q, String>],
    fragments: &Fragments<'a, 'q>,
    variables: &Map<String, Value>,
    out: &mut Vec<&'a Field<'q, String>>,
) -> BlogResult<()> {
    for item in items {
        match item {
            Selection::Field(field) => {
                if is_included(&field.directives, variables) {
                    out.push(field);
                }
            }
            Selection::InlineFragment(inline) => {
                // Every type is concrete, so type conditions never narrow
                if is_included(&inline.directives, variables) {
                    flatten_fields(&inline.selection_set.items, fragments, variables, out)?;
                }
            }
            Selection::FragmentSpread(spread) => {
                if !is_included(&spread.directives, variables) {
                    continue;
                }
                let name = spread.fragment_name.as_str();
                let fragment = fragments.get(name).copied().ok_or_else(|| RequestError::Parse {
                    message: format!("Unknown fragment '{}'", name),
                })?;
                flatten_fields(&fragment.selection_set.items, fragments, variables, out)?;
            }
        }
    }
    Ok(())
}

/// Convert a GraphQL selection set into the engine's selection tree
fn build_selection<'a, 'q>(
    items: &'a [Selection<'q, String>],
    fragments: &Fragments<'a, 'q>,
    variables: &Map<String, Value>,
) -> BlogResult<Vec<FieldSelection>> {
    let mut fields = Vec::new();
    flatten_fields(items, fragments, variables, &mut fields)?;

    fields
        .into_iter()
        .map(|field| {
            Ok(FieldSelection {
                name: field.name.clone(),
                alias: field.alias.clone(),
                selection: build_selection(&field.selection_set.items, fragments, variables)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityKind;
    use crate::core::schema::SchemaDescription;
    use crate::storage::SeedData;

    fn executor() -> GraphQLExecutor {
        let host = ServerHost::from_parts(SchemaDescription::blog(), SeedData::demo())
            .expect("should build host");
        GraphQLExecutor::new(Arc::new(host))
    }

    fn run(query: &str) -> Value {
        executor().execute(query, None, None)
    }

    #[test]
    fn test_query_with_alias() {
        let response = run("{ people: users(query: \"lau\") { id name } }");
        assert_eq!(
            response,
            json!({ "data": { "people": [{ "id": "3", "name": "Lauren" }] } })
        );
    }

    #[test]
    fn test_multiple_root_fields() {
        let response = run("query { me { name } post { title } }");
        assert_eq!(
            response,
            json!({ "data": { "me": { "name": "Ash" }, "post": { "title": "GraphQL is cool" } } })
        );
    }

    #[test]
    fn test_variables_and_defaults() {
        let executor = executor();
        let query = "query Find($q: String = \"trev\") { users(query: $q) { name } }";

        let defaulted = executor.execute(query, None, None);
        assert_eq!(defaulted["data"]["users"], json!([{ "name": "Trevor" }]));

        let variables: Map<String, Value> = serde_json::from_value(json!({ "q": "ash" })).unwrap();
        let provided = executor.execute(query, Some(variables), None);
        assert_eq!(provided["data"]["users"], json!([{ "name": "Ash" }]));
    }

    #[test]
    fn test_fragments_are_expanded() {
        let response = run(
            r#"
            query {
                comments {
                    ...CommentFields
                    ... on Comment { author { name } }
                }
            }
            fragment CommentFields on Comment { id text }
            "#,
        );
        let first = &response["data"]["comments"][0];
        assert_eq!(first["id"], "2141");
        assert_eq!(first["author"]["name"], "Ash");
        assert!(first.get("text").is_some());
    }

    #[test]
    fn test_fragment_cycle_rejected() {
        let response = run(
            r#"
            { users { ...A } }
            fragment A on User { ...B }
            fragment B on User { ...A }
            "#,
        );
        assert_eq!(response["errors"][0]["extensions"]["code"], "PARSE_ERROR");
    }

    #[test]
    fn test_fragment_cycle_through_nested_fields_rejected() {
        let response = run(
            r#"
            { users { ...U } }
            fragment U on User { posts { ...P } }
            fragment P on Post { author { ...U } }
            "#,
        );
        assert_eq!(response["errors"][0]["extensions"]["code"], "PARSE_ERROR");
    }

    #[test]
    fn test_unused_fragment_cycle_rejected() {
        let response = run(
            r#"
            { me { name } }
            fragment C on Comment { post { comments { ...C } } }
            "#,
        );
        assert_eq!(response["errors"][0]["extensions"]["code"], "PARSE_ERROR");
    }

    #[test]
    fn test_shared_fragment_is_not_a_cycle() {
        let response = run(
            r#"
            { comments { author { ...Name } post { author { ...Name } } } }
            fragment Name on User { name }
            "#,
        );
        assert_eq!(
            response["data"]["comments"][0],
            json!({ "author": { "name": "Ash" }, "post": { "author": { "name": "Ash" } } })
        );
    }

    #[test]
    fn test_skip_and_include() {
        let response = run("{ me { id @skip(if: true) name @include(if: true) age @include(if: false) } }");
        assert_eq!(response["data"]["me"], json!({ "name": "Ash" }));
    }

    #[test]
    fn test_mutation_document() {
        let response = run(
            r#"mutation {
                createUser(data: { name: "Kim", email: "kim@kim.kim", age: 30 }) { name age }
            }"#,
        );
        assert_eq!(
            response,
            json!({ "data": { "createUser": { "name": "Kim", "age": 30 } } })
        );
    }

    #[test]
    fn test_several_mutation_fields_rejected_without_writing() {
        let executor = executor();
        let response = executor.execute(
            r#"mutation {
                a: createUser(data: { name: "Kim", email: "kim@kim.kim" }) { id }
                b: createUser(data: { name: "Kim 2", email: "kim@kim.kim" }) { id }
            }"#,
            None,
            None,
        );
        assert_eq!(response["errors"][0]["extensions"]["code"], "UNSUPPORTED");
        assert_eq!(executor.host.store.len(EntityKind::User).unwrap(), 3);
    }

    #[test]
    fn test_mutation_with_root_typename() {
        let response = run(
            r#"mutation { __typename createUser(data: { name: "Kim", email: "kim@kim.kim" }) { name } }"#,
        );
        assert_eq!(
            response,
            json!({ "data": { "__typename": "Mutation", "createUser": { "name": "Kim" } } })
        );
    }

    #[test]
    fn test_conflicting_root_keys_rejected() {
        let response = run("{ a: me { name } a: post { title } }");
        assert_eq!(response["errors"][0]["extensions"]["code"], "UNSUPPORTED");

        let repeated = run("{ me { name } me { name } }");
        assert_eq!(repeated, json!({ "data": { "me": { "name": "Ash" } } }));
    }

    #[test]
    fn test_mutation_field_in_query_rejected() {
        let response = run("{ createUser(data: { name: \"K\", email: \"k@k\" }) { id } }");
        assert_eq!(response["errors"][0]["extensions"]["code"], "UNKNOWN_OPERATION");
    }

    #[test]
    fn test_failing_root_field_discards_data() {
        let response = run("{ me { name } post { author { name } } }");
        assert!(response.get("data").is_none());
        assert_eq!(response["errors"].as_array().unwrap().len(), 1);
        assert_eq!(response["errors"][0]["extensions"]["kind"], "NOT_FOUND");
    }

    #[test]
    fn test_operation_name_selection() {
        let executor = executor();
        let doc = "query A { me { name } } query B { post { title } }";

        let b = executor.execute(doc, None, Some("B"));
        assert_eq!(b["data"]["post"]["title"], "GraphQL is cool");

        let ambiguous = executor.execute(doc, None, None);
        assert_eq!(ambiguous["errors"][0]["extensions"]["code"], "UNSUPPORTED");

        let missing = executor.execute(doc, None, Some("C"));
        assert_eq!(missing["errors"][0]["extensions"]["code"], "OPERATION_NOT_FOUND");
    }

    #[test]
    fn test_root_typename() {
        let response = run("{ __typename }");
        assert_eq!(response, json!({ "data": { "__typename": "Query" } }));
    }

    #[test]
    fn test_parse_error() {
        let response = run("{ users { id ");
        assert_eq!(response["errors"][0]["extensions"]["code"], "PARSE_ERROR");
    }

    #[test]
    fn test_subscription_rejected() {
        let response = run("subscription { users { id } }");
        assert_eq!(response["errors"][0]["extensions"]["code"], "UNSUPPORTED");
    }
}
