//! # blog-graph
//!
//! A schema-governed query and mutation engine over three related entity
//! kinds: users, posts and comments.
//!
//! ## Features
//!
//! - **Typed Entities**: `User`, `Post` and `Comment` records with typed foreign keys
//! - **Filtered Lists**: case-insensitive substring search on users and posts
//! - **Derived Relationships**: `author`, `posts`, `comments` and `post` computed on demand
//! - **Validated Mutations**: uniqueness, referential integrity and the publish gate
//! - **Sparse Fieldsets**: responses contain exactly the selected fields
//! - **Schema-Driven**: a YAML-loadable schema compiled into a field plan
//! - **GraphQL Exposure**: `POST /graphql` over axum (feature `graphql`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use blog_graph::prelude::*;
//!
//! let store = Arc::new(EntityStore::seeded()?);
//! let schema = Arc::new(Schema::blog()?);
//! let executor = Executor::new(store, schema);
//!
//! let request = OperationRequest::new("users")
//!     .argument("query", "ash")
//!     .fields(["id", "name"])
//!     .field(FieldSelection::new("posts").fields(["title"]));
//!
//! let users = executor.execute(&request)?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Entities ===
    pub use crate::core::entity::{
        Comment, CommentId, CreateCommentInput, CreatePostInput, CreateUserInput, Entity,
        EntityKind, Post, PostId, Record, User, UserId,
    };

    // === Errors ===
    pub use crate::core::error::{
        BlogError, BlogResult, ConfigError, EntityError, ErrorKind, ErrorResponse, RequestError,
        ValidationError,
    };

    // === Engine ===
    pub use crate::core::executor::{Executor, RequestState};
    pub use crate::core::filter::{match_posts, match_users};
    pub use crate::core::resolver::{
        Cardinality, Relation, resolve_author_of, resolve_comments_of, resolve_post_of,
        resolve_posts_of,
    };
    pub use crate::core::schema::{RootOperation, Schema, SchemaDescription};
    pub use crate::core::selection::{FieldSelection, OperationRequest};
    pub use crate::core::validator::{create_comment, create_post, create_user};

    // === Storage ===
    pub use crate::storage::{Collections, EntityStore, SeedData};

    // === Config ===
    pub use crate::config::{AppConfig, ServerConfig};

    // === Server ===
    #[cfg(feature = "graphql")]
    pub use crate::server::GraphQLExposure;
    pub use crate::server::{ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
