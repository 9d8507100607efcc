//! Request Executor
//!
//! Dispatches an [`OperationRequest`] to a list query, a fixed stub or a
//! mutation, then builds the response by walking the caller's selection
//! tree. Only the selected fields are produced; scalars are read from the
//! record and relationship fields go through the resolver.
//!
//! The whole response of a query is built under a single read guard, so
//! it reflects one consistent state of the store. Any failure aborts the
//! operation: the caller gets one error and no partial data.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::entity::{EntityKind, Post, PostId, Record, User, UserId};
use crate::core::error::{BlogResult, RequestError};
use crate::core::filter::{match_posts, match_users};
use crate::core::resolver::{Resolved, resolve};
use crate::core::schema::{FieldStrategy, RootOperation, Schema};
use crate::core::selection::{FieldSelection, OperationRequest};
use crate::core::validator;
use crate::storage::{Collections, EntityStore};

/// Lifecycle of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Dispatched,
    ResolvingFields,
    Completed,
    Failed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Completed | RequestState::Failed)
    }
}

fn transition(state: RequestState) {
    tracing::debug!(state = ?state, terminal = state.is_terminal(), "Request state");
}

/// The record returned by the `me` query
pub fn stub_me() -> User {
    User {
        id: UserId::new("abc123"),
        name: "Ash".to_string(),
        email: "ash@b.com".to_string(),
        age: Some(25),
    }
}

/// The record returned by the `post` query
///
/// It has no author: resolving `author` on it fails with `NotFound`.
pub fn stub_post() -> Post {
    Post {
        id: PostId::new("aedfcb2131acb"),
        title: "GraphQL is cool".to_string(),
        body: "The best technology to master in 2018 is GraphQL. Lorem ipsum".to_string(),
        published: true,
        author: UserId::new(""),
    }
}

/// Executes operation requests against a store under a compiled schema
#[derive(Clone)]
pub struct Executor {
    store: Arc<EntityStore>,
    schema: Arc<Schema>,
}

impl Executor {
    pub fn new(store: Arc<EntityStore>, schema: Arc<Schema>) -> Self {
        Self { store, schema }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Execute one root operation and return its result shaped like the selection
    ///
    /// List operations yield a JSON array, every other operation a JSON object.
    pub fn execute(&self, request: &OperationRequest) -> BlogResult<Value> {
        let span = tracing::info_span!("operation", name = %request.operation);
        let _enter = span.enter();

        transition(RequestState::Received);
        match self.run(request) {
            Ok(value) => {
                transition(RequestState::Completed);
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(code = err.error_code(), error = %err, "Operation failed");
                transition(RequestState::Failed);
                Err(err)
            }
        }
    }

    fn run(&self, request: &OperationRequest) -> BlogResult<Value> {
        let op = self.schema.operation(&request.operation).ok_or_else(|| {
            RequestError::UnknownOperation {
                name: request.operation.clone(),
            }
        })?;

        check_arguments(op, &request.arguments)?;

        // Reject malformed selections before anything is written
        let (kind, _) = op.returns();
        if request.selection.is_empty() {
            return Err(RequestError::MissingSelection {
                field: op.name().to_string(),
                type_name: kind.name().to_string(),
            }
            .into());
        }
        self.check_selection(kind, &request.selection)?;

        transition(RequestState::Dispatched);
        tracing::debug!(operation = op.name(), mutation = op.is_mutation(), "Dispatching");

        let selection = &request.selection;
        match op {
            RootOperation::Users => {
                let query = query_argument(op, &request.arguments)?;
                let tables = self.store.read()?;
                let users = match_users(tables.users(), query.as_deref());
                self.render_many(&tables, users.into_iter().map(Record::User), selection)
            }
            RootOperation::Posts => {
                let query = query_argument(op, &request.arguments)?;
                let tables = self.store.read()?;
                let posts = match_posts(tables.posts(), query.as_deref());
                self.render_many(&tables, posts.into_iter().map(Record::Post), selection)
            }
            RootOperation::Comments => {
                let tables = self.store.read()?;
                let comments = tables.comments().to_vec();
                self.render_many(&tables, comments.into_iter().map(Record::Comment), selection)
            }
            RootOperation::Me => {
                let tables = self.store.read()?;
                self.render_one(&tables, &Record::User(stub_me()), selection)
            }
            RootOperation::Post => {
                let tables = self.store.read()?;
                self.render_one(&tables, &Record::Post(stub_post()), selection)
            }
            RootOperation::CreateUser => {
                let user = validator::create_user(&self.store, data_argument(op, &request.arguments)?)?;
                let tables = self.store.read()?;
                self.render_one(&tables, &Record::User(user), selection)
            }
            RootOperation::CreatePost => {
                let post = validator::create_post(&self.store, data_argument(op, &request.arguments)?)?;
                let tables = self.store.read()?;
                self.render_one(&tables, &Record::Post(post), selection)
            }
            RootOperation::CreateComment => {
                let comment =
                    validator::create_comment(&self.store, data_argument(op, &request.arguments)?)?;
                let tables = self.store.read()?;
                self.render_one(&tables, &Record::Comment(comment), selection)
            }
        }
    }

    /// Walk the selection tree against the field plan
    fn check_selection(&self, kind: EntityKind, selection: &[FieldSelection]) -> BlogResult<()> {
        check_response_keys(selection)?;
        for field in selection {
            match self.schema.field(kind, &field.name) {
                Some(FieldStrategy::Relation(relation)) => {
                    if field.selection.is_empty() {
                        return Err(RequestError::MissingSelection {
                            field: field.name.clone(),
                            type_name: relation.target().name().to_string(),
                        }
                        .into());
                    }
                    self.check_selection(relation.target(), &field.selection)?;
                }
                Some(FieldStrategy::Scalar(_)) | Some(FieldStrategy::Typename) => {
                    if !field.selection.is_empty() {
                        return Err(RequestError::Unsupported {
                            message: format!(
                                "Field '{}' on '{}' is a scalar and cannot have subfields",
                                field.name, kind
                            ),
                        }
                        .into());
                    }
                }
                None => {}
            }
        }
        Ok(())
    }

    fn render_many(
        &self,
        tables: &Collections,
        records: impl Iterator<Item = Record>,
        selection: &[FieldSelection],
    ) -> BlogResult<Value> {
        let rendered = records
            .map(|record| self.render_one(tables, &record, selection))
            .collect::<BlogResult<Vec<_>>>()?;
        Ok(Value::Array(rendered))
    }

    fn render_one(
        &self,
        tables: &Collections,
        record: &Record,
        selection: &[FieldSelection],
    ) -> BlogResult<Value> {
        transition(RequestState::ResolvingFields);
        self.render_record(tables, record, selection)
    }

    fn render_record(
        &self,
        tables: &Collections,
        record: &Record,
        selection: &[FieldSelection],
    ) -> BlogResult<Value> {
        let kind = record.kind();
        let mut object = Map::new();

        for field in selection {
            let value = match self.schema.field(kind, &field.name) {
                Some(FieldStrategy::Scalar(scalar)) => record.scalar(scalar).unwrap_or(Value::Null),
                Some(FieldStrategy::Typename) => json!(kind.name()),
                Some(FieldStrategy::Relation(relation)) => {
                    match resolve(tables, relation, record)? {
                        Resolved::One(target) => {
                            self.render_record(tables, &target, &field.selection)?
                        }
                        Resolved::Many(targets) => Value::Array(
                            targets
                                .iter()
                                .map(|target| self.render_record(tables, target, &field.selection))
                                .collect::<BlogResult<Vec<_>>>()?,
                        ),
                    }
                }
                None => {
                    tracing::debug!(entity = %kind, field = %field.name, "Omitting unknown field");
                    continue;
                }
            };
            object.insert(field.response_key().to_string(), value);
        }

        Ok(Value::Object(object))
    }
}

/// Reject arguments the operation does not declare and required ones that are missing
fn check_arguments(op: RootOperation, arguments: &Map<String, Value>) -> BlogResult<()> {
    let declared = op.arguments();

    if let Some(unknown) = arguments
        .keys()
        .find(|name| !declared.iter().any(|(declared, _, _)| *declared == name.as_str()))
    {
        return Err(RequestError::InvalidArgument {
            operation: op.name().to_string(),
            argument: unknown.clone(),
            message: "unknown argument".to_string(),
        }
        .into());
    }

    for (name, _, nullable) in declared {
        let present = arguments.get(*name).is_some_and(|value| !value.is_null());
        if !present && !nullable {
            return Err(RequestError::MissingArgument {
                operation: op.name().to_string(),
                argument: name.to_string(),
            }
            .into());
        }
    }

    Ok(())
}

/// The optional `query` argument of list operations; null counts as absent
fn query_argument(op: RootOperation, arguments: &Map<String, Value>) -> BlogResult<Option<String>> {
    match arguments.get("query") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(query)) => Ok(Some(query.clone())),
        Some(other) => Err(RequestError::InvalidArgument {
            operation: op.name().to_string(),
            argument: "query".to_string(),
            message: format!("expected a string, got {}", other),
        }
        .into()),
    }
}

/// The `data` input object of a mutation
fn data_argument<T: DeserializeOwned>(
    op: RootOperation,
    arguments: &Map<String, Value>,
) -> BlogResult<T> {
    let invalid = |message: String| RequestError::InvalidArgument {
        operation: op.name().to_string(),
        argument: "data".to_string(),
        message,
    };

    let data = arguments
        .get("data")
        .ok_or_else(|| RequestError::MissingArgument {
            operation: op.name().to_string(),
            argument: "data".to_string(),
        })?;
    if !data.is_object() {
        return Err(invalid("expected an input object".to_string()).into());
    }

    serde_json::from_value(data.clone()).map_err(|e| invalid(e.to_string()).into())
}

/// Two selections may share a response key only if they ask for the same thing
fn check_response_keys(selection: &[FieldSelection]) -> BlogResult<()> {
    let mut seen: HashMap<&str, &FieldSelection> = HashMap::new();
    for field in selection {
        let key = field.response_key();
        if let Some(previous) = seen.insert(key, field)
            && (previous.name != field.name || previous.selection != field.selection)
        {
            return Err(RequestError::Unsupported {
                message: format!(
                    "Fields '{}' and '{}' conflict on response key '{}'",
                    previous.name, field.name, key
                ),
            }
            .into());
        }
    }
    Ok(())
}
