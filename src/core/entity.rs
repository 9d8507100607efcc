//! Typed entity records and mutation inputs
//!
//! The three entity kinds are explicit structs. Foreign keys are typed
//! identifiers ([`UserId`], [`PostId`]) rather than bare strings, so a
//! comment's `post` can never be looked up in the user collection.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use validator::Validate;

use crate::impl_entity_id;

impl_entity_id!(
    /// Identifier of a [`User`]
    UserId
);

impl_entity_id!(
    /// Identifier of a [`Post`]
    PostId
);

impl_entity_id!(
    /// Identifier of a [`Comment`]
    CommentId
);

/// The entity kinds known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Post,
    Comment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::User, EntityKind::Post, EntityKind::Comment];

    /// Type name as it appears in the schema (e.g., "User")
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Post => "Post",
            EntityKind::Comment => "Comment",
        }
    }

    /// Parse a schema type name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Scalar fields stored on records of this kind
    pub fn scalar_fields(&self) -> &'static [ScalarSpec] {
        match self {
            EntityKind::User => USER_SCALARS,
            EntityKind::Post => POST_SCALARS,
            EntityKind::Comment => COMMENT_SCALARS,
        }
    }

    /// Look up a stored scalar field by name
    pub fn scalar_field(&self, name: &str) -> Option<&'static ScalarSpec> {
        self.scalar_fields().iter().find(|spec| spec.name == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar types a stored field can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    #[serde(rename = "ID")]
    Id,
    String,
    Int,
    Boolean,
}

impl ScalarType {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Id => "ID",
            ScalarType::String => "String",
            ScalarType::Int => "Int",
            ScalarType::Boolean => "Boolean",
        }
    }
}

/// A readable scalar field of some entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    Id,
    Name,
    Email,
    Age,
    Title,
    Body,
    Published,
    Text,
}

/// Static description of a stored scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarSpec {
    pub name: &'static str,
    pub field: ScalarField,
    pub scalar_type: ScalarType,
    pub nullable: bool,
}

const fn spec(
    name: &'static str,
    field: ScalarField,
    scalar_type: ScalarType,
    nullable: bool,
) -> ScalarSpec {
    ScalarSpec {
        name,
        field,
        scalar_type,
        nullable,
    }
}

const USER_SCALARS: &[ScalarSpec] = &[
    spec("id", ScalarField::Id, ScalarType::Id, false),
    spec("name", ScalarField::Name, ScalarType::String, false),
    spec("email", ScalarField::Email, ScalarType::String, false),
    spec("age", ScalarField::Age, ScalarType::Int, true),
];

const POST_SCALARS: &[ScalarSpec] = &[
    spec("id", ScalarField::Id, ScalarType::Id, false),
    spec("title", ScalarField::Title, ScalarType::String, false),
    spec("body", ScalarField::Body, ScalarType::String, false),
    spec("published", ScalarField::Published, ScalarType::Boolean, false),
];

const COMMENT_SCALARS: &[ScalarSpec] = &[
    spec("id", ScalarField::Id, ScalarType::Id, false),
    spec("text", ScalarField::Text, ScalarType::String, false),
];

/// Common behaviour of all entity records
pub trait Entity: Clone + Send + Sync + 'static {
    /// The kind of this entity
    const KIND: EntityKind;

    /// Raw identifier of this record
    fn id_str(&self) -> &str;

    /// Read a scalar field, `None` when this kind has no such field
    fn scalar(&self, field: ScalarField) -> Option<Value>;
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<i64>,
}

/// A blog post written by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub author: UserId,
}

/// A comment left by a user on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author: UserId,
    pub post: PostId,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id_str(&self) -> &str {
        self.id.as_str()
    }

    fn scalar(&self, field: ScalarField) -> Option<Value> {
        match field {
            ScalarField::Id => Some(json!(self.id)),
            ScalarField::Name => Some(json!(self.name)),
            ScalarField::Email => Some(json!(self.email)),
            ScalarField::Age => Some(json!(self.age)),
            _ => None,
        }
    }
}

impl Entity for Post {
    const KIND: EntityKind = EntityKind::Post;

    fn id_str(&self) -> &str {
        self.id.as_str()
    }

    fn scalar(&self, field: ScalarField) -> Option<Value> {
        match field {
            ScalarField::Id => Some(json!(self.id)),
            ScalarField::Title => Some(json!(self.title)),
            ScalarField::Body => Some(json!(self.body)),
            ScalarField::Published => Some(json!(self.published)),
            _ => None,
        }
    }
}

impl Entity for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn id_str(&self) -> &str {
        self.id.as_str()
    }

    fn scalar(&self, field: ScalarField) -> Option<Value> {
        match field {
            ScalarField::Id => Some(json!(self.id)),
            ScalarField::Text => Some(json!(self.text)),
            _ => None,
        }
    }
}

/// A record of any kind, as handled by the store and the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    User(User),
    Post(Post),
    Comment(Comment),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::User(_) => EntityKind::User,
            Record::Post(_) => EntityKind::Post,
            Record::Comment(_) => EntityKind::Comment,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::User(user) => user.id_str(),
            Record::Post(post) => post.id_str(),
            Record::Comment(comment) => comment.id_str(),
        }
    }

    pub fn scalar(&self, field: ScalarField) -> Option<Value> {
        match self {
            Record::User(user) => user.scalar(field),
            Record::Post(post) => post.scalar(field),
            Record::Comment(comment) => comment.scalar(field),
        }
    }
}

impl From<User> for Record {
    fn from(user: User) -> Self {
        Record::User(user)
    }
}

impl From<Post> for Record {
    fn from(post: Post) -> Self {
        Record::Post(post)
    }
}

impl From<Comment> for Record {
    fn from(comment: Comment) -> Self {
        Record::Comment(comment)
    }
}

// =============================================================================
// Mutation inputs
// =============================================================================

/// Input of the `createUser` mutation
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateUserInput {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub email: String,
    #[serde(default)]
    pub age: Option<i64>,
}

/// Input of the `createPost` mutation
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatePostInput {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub body: String,
    pub published: bool,
    pub author: UserId,
}

/// Input of the `createComment` mutation
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentInput {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub text: String,
    pub author: UserId,
    pub post: PostId,
}

impl User {
    pub fn from_input(id: UserId, input: CreateUserInput) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            age: input.age,
        }
    }
}

impl Post {
    pub fn from_input(id: PostId, input: CreatePostInput) -> Self {
        Self {
            id,
            title: input.title,
            body: input.body,
            published: input.published,
            author: input.author,
        }
    }
}

impl Comment {
    pub fn from_input(id: CommentId, input: CreateCommentInput) -> Self {
        Self {
            id,
            text: input.text,
            author: input.author,
            post: input.post,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ash() -> User {
        User {
            id: UserId::new("1"),
            name: "Ash".to_string(),
            email: "ash@ash.ash".to_string(),
            age: Some(25),
        }
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EntityKind::from_name("user"), None);
    }

    #[test]
    fn test_user_scalars() {
        let user = ash();
        assert_eq!(user.scalar(ScalarField::Id), Some(json!("1")));
        assert_eq!(user.scalar(ScalarField::Age), Some(json!(25)));
        assert_eq!(user.scalar(ScalarField::Title), None);
    }

    #[test]
    fn test_missing_age_reads_as_null() {
        let user = User { age: None, ..ash() };
        assert_eq!(user.scalar(ScalarField::Age), Some(Value::Null));
    }

    #[test]
    fn test_foreign_keys_are_not_scalars() {
        assert!(EntityKind::Post.scalar_field("author").is_none());
        assert!(EntityKind::Comment.scalar_field("post").is_none());
        assert!(EntityKind::Post.scalar_field("published").is_some());
    }

    #[test]
    fn test_record_dispatch() {
        let record = Record::from(ash());
        assert_eq!(record.kind(), EntityKind::User);
        assert_eq!(record.id(), "1");
        assert_eq!(record.scalar(ScalarField::Name), Some(json!("Ash")));
    }

    #[test]
    fn test_create_user_input_rejects_empty_name() {
        let input = CreateUserInput {
            name: String::new(),
            email: "x@y.z".to_string(),
            age: None,
        };
        let errors = input.validate().expect_err("empty name should fail");
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_create_post_input_deserializes_typed_author() {
        let input: CreatePostInput = serde_json::from_value(json!({
            "title": "t",
            "body": "b",
            "published": true,
            "author": "1"
        }))
        .unwrap();
        assert_eq!(input.author, UserId::new("1"));
    }

    #[test]
    fn test_input_rejects_unknown_fields() {
        let result: Result<CreateCommentInput, _> = serde_json::from_value(json!({
            "text": "hi",
            "author": "1",
            "post": "2",
            "likes": 3
        }));
        assert!(result.is_err());
    }
}
