//! In-memory entity store
//!
//! The store is the single owner of the user, post and comment
//! collections. Reads share a read lock; every write goes through an
//! exclusive write guard, which the mutation validator holds across its
//! check-then-insert sequence.

use crate::core::entity::{
    Comment, CommentId, EntityKind, Post, PostId, Record, User, UserId,
};
use crate::core::error::{BlogError, BlogResult};
use crate::storage::seed::SeedData;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The three record collections, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Collections {
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// All records of a kind, in insertion order
    pub fn list(&self, kind: EntityKind) -> Vec<Record> {
        match kind {
            EntityKind::User => self.users.iter().cloned().map(Record::User).collect(),
            EntityKind::Post => self.posts.iter().cloned().map(Record::Post).collect(),
            EntityKind::Comment => self
                .comments
                .iter()
                .cloned()
                .map(Record::Comment)
                .collect(),
        }
    }

    pub fn find_user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|user| &user.id == id)
    }

    pub fn find_post(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == id)
    }

    pub fn find_comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| &comment.id == id)
    }

    /// Look up a record by kind and raw id; absence is not an error
    pub fn find_by_id(&self, kind: EntityKind, id: &str) -> Option<Record> {
        match kind {
            EntityKind::User => self.find_user(&UserId::new(id)).cloned().map(Record::User),
            EntityKind::Post => self.find_post(&PostId::new(id)).cloned().map(Record::Post),
            EntityKind::Comment => self
                .find_comment(&CommentId::new(id))
                .cloned()
                .map(Record::Comment),
        }
    }

    pub fn exists_by_id(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::User => self.users.iter().any(|user| user.id.as_str() == id),
            EntityKind::Post => self.posts.iter().any(|post| post.id.as_str() == id),
            EntityKind::Comment => self.comments.iter().any(|c| c.id.as_str() == id),
        }
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::User => self.users.len(),
            EntityKind::Post => self.posts.len(),
            EntityKind::Comment => self.comments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.posts.is_empty() && self.comments.is_empty()
    }

    /// Append a fully-formed record to its collection
    ///
    /// Validation happens upstream; this never fails.
    pub(crate) fn insert(&mut self, record: Record) {
        match record {
            Record::User(user) => self.users.push(user),
            Record::Post(post) => self.posts.push(post),
            Record::Comment(comment) => self.comments.push(comment),
        }
    }

    #[cfg(test)]
    pub(crate) fn posts_mut(&mut self) -> &mut Vec<Post> {
        &mut self.posts
    }
}

/// Process-wide entity store
///
/// Thread-safe through a single `RwLock` over all three collections.
#[derive(Debug, Default)]
pub struct EntityStore {
    tables: RwLock<Collections>,
}

impl EntityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the built-in demo records
    pub fn seeded() -> BlogResult<Self> {
        Self::from_seed(SeedData::demo())
    }

    /// Create a store from seed data
    ///
    /// Checks id uniqueness per collection and that every foreign key
    /// resolves. The publish gate only applies to new comments, so seeded
    /// comments may reference unpublished posts.
    pub fn from_seed(seed: SeedData) -> BlogResult<Self> {
        seed.check()?;

        let mut tables = Collections::default();
        for user in seed.users {
            tables.insert(Record::User(user));
        }
        for post in seed.posts {
            tables.insert(Record::Post(post));
        }
        for comment in seed.comments {
            tables.insert(Record::Comment(comment));
        }

        tracing::debug!(
            users = tables.len(EntityKind::User),
            posts = tables.len(EntityKind::Post),
            comments = tables.len(EntityKind::Comment),
            "Entity store seeded"
        );

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Acquire shared read access to the collections
    pub fn read(&self) -> BlogResult<RwLockReadGuard<'_, Collections>> {
        self.tables.read().map_err(BlogError::lock_poisoned)
    }

    /// Acquire exclusive write access to the collections
    pub(crate) fn write(&self) -> BlogResult<RwLockWriteGuard<'_, Collections>> {
        self.tables.write().map_err(BlogError::lock_poisoned)
    }

    pub fn list(&self, kind: EntityKind) -> BlogResult<Vec<Record>> {
        Ok(self.read()?.list(kind))
    }

    pub fn find_by_id(&self, kind: EntityKind, id: &str) -> BlogResult<Option<Record>> {
        Ok(self.read()?.find_by_id(kind, id))
    }

    pub fn exists_by_id(&self, kind: EntityKind, id: &str) -> BlogResult<bool> {
        Ok(self.read()?.exists_by_id(kind, id))
    }

    pub fn len(&self, kind: EntityKind) -> BlogResult<usize> {
        Ok(self.read()?.len(kind))
    }

    /// Copy of the current collections
    pub fn snapshot(&self) -> BlogResult<Collections> {
        Ok(self.read()?.clone())
    }
}
