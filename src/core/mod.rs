//! Core engine: typed entities, filtering, relationship resolution,
//! mutation validation and request execution

pub mod entity;
pub mod error;
pub mod executor;
pub mod filter;
pub mod resolver;
pub mod schema;
pub mod selection;
pub mod validator;

pub use entity::{
    Comment, CommentId, CreateCommentInput, CreatePostInput, CreateUserInput, Entity, EntityKind,
    Post, PostId, Record, User, UserId,
};
pub use error::{BlogError, BlogResult, EntityError, ErrorKind, ErrorResponse};
pub use executor::{Executor, RequestState};
pub use filter::{Searchable, match_posts, match_users};
pub use resolver::{Cardinality, Relation, Resolved};
pub use schema::{FieldStrategy, RootOperation, Schema, SchemaDescription};
pub use selection::{FieldSelection, OperationRequest};
