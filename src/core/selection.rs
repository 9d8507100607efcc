//! Protocol-agnostic requests: an operation name, its arguments and the
//! tree of fields the caller wants back

use serde_json::{Map, Value};

/// One requested field, possibly with nested selections
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSelection {
    /// Field name as declared by the schema
    pub name: String,

    /// Key to use in the response instead of the field name
    pub alias: Option<String>,

    /// Nested selections (empty for scalar fields)
    pub selection: Vec<FieldSelection>,
}

impl FieldSelection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            selection: Vec::new(),
        }
    }

    /// Set the response key for this field
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add a nested field
    pub fn field(mut self, child: FieldSelection) -> Self {
        self.selection.push(child);
        self
    }

    /// Add several nested leaf fields
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection
            .extend(names.into_iter().map(FieldSelection::new));
        self
    }

    /// Key under which this field appears in the response
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A request for one root operation
///
/// # Example
///
/// ```rust,ignore
/// let request = OperationRequest::new("users")
///     .argument("query", "ash")
///     .fields(["id", "name"])
///     .field(FieldSelection::new("posts").fields(["title"]));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationRequest {
    /// Root operation name (e.g., "users", "createPost")
    pub operation: String,

    /// Arguments passed to the operation
    pub arguments: Map<String, Value>,

    /// Fields requested on the result
    pub selection: Vec<FieldSelection>,
}

impl OperationRequest {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            arguments: Map::new(),
            selection: Vec::new(),
        }
    }

    /// Set an argument
    pub fn argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Add a requested field
    pub fn field(mut self, child: FieldSelection) -> Self {
        self.selection.push(child);
        self
    }

    /// Add several requested leaf fields
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection
            .extend(names.into_iter().map(FieldSelection::new));
        self
    }
}
