//! Typed error handling for the blog-graph engine
//!
//! Every failure surfaced by the engine is a [`BlogError`]. The variants
//! group errors by category so callers can match on what went wrong
//! instead of parsing messages.
//!
//! # Error Categories
//!
//! - [`EntityError`]: referential integrity and uniqueness failures
//!   (the `Conflict`, `NotFound` and `InvalidState` kinds)
//! - [`ValidationError`]: malformed mutation input
//! - [`RequestError`]: requests the engine cannot dispatch
//! - [`ConfigError`]: schema, seed and configuration problems
//!
//! # Example
//!
//! ```rust,ignore
//! match executor.execute(&request) {
//!     Ok(value) => println!("{}", value),
//!     Err(BlogError::Entity(EntityError::Conflict { .. })) => println!("duplicate"),
//!     Err(e) => eprintln!("{} ({})", e, e.error_code()),
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::core::entity::EntityKind;

/// The main error type of the engine
#[derive(Debug, Error)]
pub enum BlogError {
    /// Referential integrity and uniqueness errors
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Mutation input validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Errors in the shape of the incoming request
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Schema, seed and configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal engine errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`BlogError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A uniqueness constraint is violated
    Conflict,
    /// A required reference does not resolve to an existing record
    NotFound,
    /// A referenced record exists but fails a required state predicate
    InvalidState,
    /// The mutation input is malformed
    Validation,
    /// The request cannot be dispatched
    BadRequest,
    /// Configuration or internal failure
    Internal,
}

/// Error payload exposed to callers
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Coarse error kind
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl BlogError {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BlogError::Entity(e) => e.kind(),
            BlogError::Validation(_) => ErrorKind::Validation,
            BlogError::Request(_) => ErrorKind::BadRequest,
            BlogError::Config(_) | BlogError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            BlogError::Entity(e) => e.error_code(),
            BlogError::Validation(_) => "VALIDATION_ERROR",
            BlogError::Request(e) => e.error_code(),
            BlogError::Config(_) => "CONFIG_ERROR",
            BlogError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            kind: self.kind(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            BlogError::Entity(EntityError::NotFound { entity, id, .. })
            | BlogError::Entity(EntityError::InvalidState { entity, id, .. }) => {
                Some(serde_json::json!({
                    "entity": entity.name(),
                    "id": id,
                }))
            }
            BlogError::Entity(EntityError::Conflict { entity, field, .. }) => {
                Some(serde_json::json!({
                    "entity": entity.name(),
                    "field": field,
                }))
            }
            BlogError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }

    pub(crate) fn lock_poisoned(err: impl std::fmt::Display) -> Self {
        BlogError::Internal(format!("Entity store lock poisoned: {}", err))
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Referential integrity and uniqueness errors
#[derive(Debug, Error)]
pub enum EntityError {
    /// A referenced record does not exist
    #[error("{message}")]
    NotFound {
        entity: EntityKind,
        id: String,
        message: String,
    },

    /// A uniqueness constraint is violated
    #[error("{message}")]
    Conflict {
        entity: EntityKind,
        field: &'static str,
        message: String,
    },

    /// A referenced record exists but is not in the required state
    #[error("{message}")]
    InvalidState {
        entity: EntityKind,
        id: String,
        message: String,
    },
}

impl EntityError {
    pub fn user_not_found(id: impl Into<String>) -> Self {
        EntityError::NotFound {
            entity: EntityKind::User,
            id: id.into(),
            message: "User not found".to_string(),
        }
    }

    pub fn post_not_found(id: impl Into<String>) -> Self {
        EntityError::NotFound {
            entity: EntityKind::Post,
            id: id.into(),
            message: "Post not found".to_string(),
        }
    }

    pub fn email_taken() -> Self {
        EntityError::Conflict {
            entity: EntityKind::User,
            field: "email",
            message: "Email taken".to_string(),
        }
    }

    /// The comment target is missing or not published
    pub fn post_not_published(id: impl Into<String>) -> Self {
        EntityError::InvalidState {
            entity: EntityKind::Post,
            id: id.into(),
            message: "Unable to find published post".to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EntityError::NotFound { .. } => ErrorKind::NotFound,
            EntityError::Conflict { .. } => ErrorKind::Conflict,
            EntityError::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::Conflict { .. } => "ENTITY_CONFLICT",
            EntityError::InvalidState { .. } => "ENTITY_INVALID_STATE",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to mutation input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or more input fields are invalid
    #[error("Validation errors: {}", format_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

fn format_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldValidationError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        // HashMap iteration order is unspecified
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::FieldErrors(fields)
    }
}

impl From<validator::ValidationErrors> for BlogError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BlogError::Validation(errors.into())
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors in the shape of an incoming request
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request document could not be parsed
    #[error("Failed to parse query: {message}")]
    Parse { message: String },

    /// The operation is not declared by the schema
    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    /// A named operation was requested but the document does not contain it
    #[error("Operation '{name}' not found in document")]
    OperationNotFound { name: String },

    /// A required argument is missing
    #[error("Missing required argument '{argument}' for '{operation}'")]
    MissingArgument { operation: String, argument: String },

    /// An argument has the wrong shape
    #[error("Invalid argument '{argument}' for '{operation}': {message}")]
    InvalidArgument {
        operation: String,
        argument: String,
        message: String,
    },

    /// An object-typed field was requested without a sub-selection
    #[error("Field '{field}' of type '{type_name}' must have a selection of subfields")]
    MissingSelection { field: String, type_name: String },

    /// The request uses a feature the engine does not offer
    #[error("{message}")]
    Unsupported { message: String },
}

impl RequestError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Parse { .. } => "PARSE_ERROR",
            RequestError::UnknownOperation { .. } => "UNKNOWN_OPERATION",
            RequestError::OperationNotFound { .. } => "OPERATION_NOT_FOUND",
            RequestError::MissingArgument { .. } => "MISSING_ARGUMENT",
            RequestError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            RequestError::MissingSelection { .. } => "MISSING_SELECTION",
            RequestError::Unsupported { .. } => "UNSUPPORTED",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors raised while loading the schema, the seed data or the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The schema names an entity the engine does not know
    #[error("Unknown entity type '{name}'")]
    UnknownEntity { name: String },

    /// The schema declares a scalar field the record does not store
    #[error("Unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    /// The schema declares a scalar with a type the record cannot provide
    #[error("Field '{entity}.{field}' declared as {declared}, but the record stores {actual}")]
    FieldTypeMismatch {
        entity: String,
        field: String,
        declared: String,
        actual: String,
    },

    /// The schema declares a relationship no resolver implements
    #[error("No resolver for relationship '{entity}.{field}' -> {target}")]
    UnknownRelation {
        entity: String,
        field: String,
        target: String,
    },

    /// The schema declares a root operation the engine does not implement
    #[error("Unknown root operation '{name}'")]
    UnknownOperation { name: String },

    /// A root operation is declared with an unexpected signature
    #[error("Invalid signature for operation '{operation}': {message}")]
    InvalidSignature { operation: String, message: String },

    /// A name is declared twice
    #[error("Duplicate definition of '{name}'")]
    Duplicate { name: String },

    /// The seed data breaks an invariant
    #[error("Invalid seed data: {message}")]
    InvalidSeed { message: String },

    /// A file could not be read or parsed
    #[error("Failed to load '{path}': {message}")]
    Load { path: String, message: String },
}

/// A specialized Result type for engine operations
pub type BlogResult<T> = Result<T, BlogError>;
