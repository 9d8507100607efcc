//! Relationship resolution by foreign-key traversal
//!
//! Relationships are never stored; they are computed from the `author`
//! and `post` foreign keys against the current collections. A dangling
//! foreign key is reported as `NotFound` instead of resolving to nothing.

use serde::{Deserialize, Serialize};

use crate::core::entity::{Comment, EntityKind, Post, Record, User, UserId};
use crate::core::error::{BlogError, BlogResult, EntityError};
use crate::storage::Collections;

/// How many records a relationship yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// Every relationship the engine can resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    UserPosts,
    UserComments,
    PostAuthor,
    PostComments,
    CommentAuthor,
    CommentPost,
}

impl Relation {
    pub const ALL: [Relation; 6] = [
        Relation::UserPosts,
        Relation::UserComments,
        Relation::PostAuthor,
        Relation::PostComments,
        Relation::CommentAuthor,
        Relation::CommentPost,
    ];

    /// Entity kind the relationship starts from
    pub fn source(&self) -> EntityKind {
        match self {
            Relation::UserPosts | Relation::UserComments => EntityKind::User,
            Relation::PostAuthor | Relation::PostComments => EntityKind::Post,
            Relation::CommentAuthor | Relation::CommentPost => EntityKind::Comment,
        }
    }

    /// Field name the relationship is exposed under
    pub fn field_name(&self) -> &'static str {
        match self {
            Relation::UserPosts => "posts",
            Relation::UserComments | Relation::PostComments => "comments",
            Relation::PostAuthor | Relation::CommentAuthor => "author",
            Relation::CommentPost => "post",
        }
    }

    /// Entity kind of the related records
    pub fn target(&self) -> EntityKind {
        match self {
            Relation::PostAuthor | Relation::CommentAuthor => EntityKind::User,
            Relation::UserPosts | Relation::CommentPost => EntityKind::Post,
            Relation::UserComments | Relation::PostComments => EntityKind::Comment,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Relation::UserPosts | Relation::UserComments | Relation::PostComments => {
                Cardinality::Many
            }
            Relation::PostAuthor | Relation::CommentAuthor | Relation::CommentPost => {
                Cardinality::One
            }
        }
    }

    /// Find the relationship exposed as `field` on `source`
    pub fn lookup(source: EntityKind, field: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|relation| relation.source() == source && relation.field_name() == field)
    }
}

/// Records carrying an `author` foreign key
pub trait Authored {
    fn author_id(&self) -> &UserId;
}

impl Authored for Post {
    fn author_id(&self) -> &UserId {
        &self.author
    }
}

impl Authored for Comment {
    fn author_id(&self) -> &UserId {
        &self.author
    }
}

/// Records that own a list of comments
pub trait CommentOwner {
    fn owns(&self, comment: &Comment) -> bool;
}

impl CommentOwner for User {
    fn owns(&self, comment: &Comment) -> bool {
        comment.author == self.id
    }
}

impl CommentOwner for Post {
    fn owns(&self, comment: &Comment) -> bool {
        comment.post == self.id
    }
}

/// The user referenced by a post's or comment's `author`
pub fn resolve_author_of<T: Authored>(tables: &Collections, record: &T) -> BlogResult<User> {
    let author = record.author_id();
    tables
        .find_user(author)
        .cloned()
        .ok_or_else(|| EntityError::user_not_found(author.as_str()).into())
}

/// The post referenced by a comment's `post`
pub fn resolve_post_of(tables: &Collections, comment: &Comment) -> BlogResult<Post> {
    tables
        .find_post(&comment.post)
        .cloned()
        .ok_or_else(|| EntityError::post_not_found(comment.post.as_str()).into())
}

/// All posts written by `user`, in insertion order
pub fn resolve_posts_of(tables: &Collections, user: &User) -> Vec<Post> {
    tables
        .posts()
        .iter()
        .filter(|post| post.author == user.id)
        .cloned()
        .collect()
}

/// All comments written by a user or left on a post, in insertion order
pub fn resolve_comments_of<T: CommentOwner>(tables: &Collections, owner: &T) -> Vec<Comment> {
    tables
        .comments()
        .iter()
        .filter(|comment| owner.owns(comment))
        .cloned()
        .collect()
}

/// Result of resolving a relationship on a record
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    One(Record),
    Many(Vec<Record>),
}

/// Resolve `relation` on `record`
///
/// Fails with `Internal` when the record is not of the relation's source
/// kind; the schema's field plan rules this out.
pub fn resolve(tables: &Collections, relation: Relation, record: &Record) -> BlogResult<Resolved> {
    let resolved = match (relation, record) {
        (Relation::UserPosts, Record::User(user)) => Resolved::Many(
            resolve_posts_of(tables, user)
                .into_iter()
                .map(Record::Post)
                .collect(),
        ),
        (Relation::UserComments, Record::User(user)) => Resolved::Many(
            resolve_comments_of(tables, user)
                .into_iter()
                .map(Record::Comment)
                .collect(),
        ),
        (Relation::PostAuthor, Record::Post(post)) => {
            Resolved::One(Record::User(resolve_author_of(tables, post)?))
        }
        (Relation::PostComments, Record::Post(post)) => Resolved::Many(
            resolve_comments_of(tables, post)
                .into_iter()
                .map(Record::Comment)
                .collect(),
        ),
        (Relation::CommentAuthor, Record::Comment(comment)) => {
            Resolved::One(Record::User(resolve_author_of(tables, comment)?))
        }
        (Relation::CommentPost, Record::Comment(comment)) => {
            Resolved::One(Record::Post(resolve_post_of(tables, comment)?))
        }
        (relation, record) => {
            return Err(BlogError::Internal(format!(
                "Relationship {:?} cannot be resolved on a {}",
                relation,
                record.kind()
            )));
        }
    };

    tracing::trace!(
        relation = ?relation,
        source = %record.kind(),
        id = record.id(),
        "Resolved relationship"
    );

    Ok(resolved)
}
