//! Write path: validate, then commit
//!
//! Each mutation holds the store's write guard for its whole
//! check-then-insert sequence, so two concurrent `create_user` calls with
//! the same email cannot both pass the uniqueness check. Nothing is
//! written unless every check passed.

use validator::Validate;

use crate::core::entity::{
    Comment, CommentId, CreateCommentInput, CreatePostInput, CreateUserInput, EntityKind, Post,
    PostId, Record, User, UserId,
};
use crate::core::error::{BlogResult, EntityError};
use crate::storage::{Collections, EntityStore};

/// Create a user after checking that its email is not taken
///
/// The email comparison is exact and case-sensitive.
pub fn create_user(store: &EntityStore, input: CreateUserInput) -> BlogResult<User> {
    input.validate()?;

    let mut tables = store.write()?;

    if tables.users().iter().any(|user| user.email == input.email) {
        tracing::warn!("createUser rejected: email taken");
        return Err(EntityError::email_taken().into());
    }

    let id = fresh_id(&tables, EntityKind::User, UserId::generate);
    let user = User::from_input(id, input);
    tables.insert(Record::User(user.clone()));

    tracing::info!(id = %user.id, "User created");
    Ok(user)
}

/// Create a post after checking that its author exists
pub fn create_post(store: &EntityStore, input: CreatePostInput) -> BlogResult<Post> {
    input.validate()?;

    let mut tables = store.write()?;

    if tables.find_user(&input.author).is_none() {
        tracing::warn!(author = %input.author, "createPost rejected: unknown author");
        return Err(EntityError::user_not_found(input.author.as_str()).into());
    }

    let id = fresh_id(&tables, EntityKind::Post, PostId::generate);
    let post = Post::from_input(id, input);
    tables.insert(Record::Post(post.clone()));

    tracing::info!(id = %post.id, author = %post.author, "Post created");
    Ok(post)
}

/// Create a comment after checking its author and its target post
///
/// The author is checked first; when it is missing the post is not
/// inspected at all. A missing post and an unpublished post are reported
/// the same way.
pub fn create_comment(store: &EntityStore, input: CreateCommentInput) -> BlogResult<Comment> {
    input.validate()?;

    let mut tables = store.write()?;

    if tables.find_user(&input.author).is_none() {
        tracing::warn!(author = %input.author, "createComment rejected: unknown author");
        return Err(EntityError::user_not_found(input.author.as_str()).into());
    }

    let published = tables
        .find_post(&input.post)
        .is_some_and(|post| post.published);
    if !published {
        tracing::warn!(post = %input.post, "createComment rejected: post missing or unpublished");
        return Err(EntityError::post_not_published(input.post.as_str()).into());
    }

    let id = fresh_id(&tables, EntityKind::Comment, CommentId::generate);
    let comment = Comment::from_input(id, input);
    tables.insert(Record::Comment(comment.clone()));

    tracing::info!(id = %comment.id, post = %comment.post, "Comment created");
    Ok(comment)
}

/// Draw random ids until one is unused in the collection
fn fresh_id<I, F>(tables: &Collections, kind: EntityKind, generate: F) -> I
where
    I: AsRef<str>,
    F: Fn() -> I,
{
    loop {
        let id = generate();
        if !tables.exists_by_id(kind, id.as_ref()) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::resolver::{resolve_author_of, resolve_posts_of};

    fn store() -> EntityStore {
        EntityStore::seeded().unwrap()
    }

    fn user_input(email: &str) -> CreateUserInput {
        CreateUserInput {
            name: "Kim".to_string(),
            email: email.to_string(),
            age: None,
        }
    }

    fn post_input(author: &str, published: bool) -> CreatePostInput {
        CreatePostInput {
            title: "Title".to_string(),
            body: "Body".to_string(),
            published,
            author: UserId::new(author),
        }
    }

    fn comment_input(author: &str, post: &str) -> CreateCommentInput {
        CreateCommentInput {
            text: "Nice".to_string(),
            author: UserId::new(author),
            post: PostId::new(post),
        }
    }

    #[test]
    fn test_create_user_assigns_fresh_id() {
        let store = store();
        let a = create_user(&store, user_input("a@x")).unwrap();
        let b = create_user(&store, user_input("b@x")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(EntityKind::User).unwrap(), 5);
    }

    #[test]
    fn test_create_user_duplicate_email_is_conflict() {
        let store = store();
        let err = create_user(&store, user_input("ash@ash.ash")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Email taken");
        assert_eq!(store.len(EntityKind::User).unwrap(), 3);
    }

    #[test]
    fn test_create_user_email_check_is_case_sensitive() {
        let store = store();
        create_user(&store, user_input("ASH@ASH.ASH")).expect("different case is a new email");
    }

    #[test]
    fn test_create_user_empty_name_is_validation_error() {
        let store = store();
        let input = CreateUserInput {
            name: String::new(),
            ..user_input("new@x")
        };
        let err = create_user(&store, input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.len(EntityKind::User).unwrap(), 3);
    }

    #[test]
    fn test_create_post_unknown_author_is_not_found() {
        let store = store();
        let err = create_post(&store, post_input("nonexistent-id", true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "User not found");
        assert_eq!(store.len(EntityKind::Post).unwrap(), 3);
    }

    #[test]
    fn test_create_post_round_trips_through_resolver() {
        let store = store();
        let post = create_post(&store, post_input("3", false)).unwrap();

        let tables = store.read().unwrap();
        let author = resolve_author_of(&tables, &post).unwrap();
        assert_eq!(author.id, UserId::new("3"));
        assert!(resolve_posts_of(&tables, &author).contains(&post));
    }

    #[test]
    fn test_create_comment_on_unpublished_post_is_invalid_state() {
        let store = store();
        let err = create_comment(&store, comment_input("1", "1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(store.len(EntityKind::Comment).unwrap(), 4);
    }

    #[test]
    fn test_create_comment_on_missing_post_is_invalid_state() {
        let store = store();
        let err = create_comment(&store, comment_input("1", "404")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_create_comment_author_checked_first() {
        let store = store();
        let err = create_comment(&store, comment_input("ghost", "404")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_publish_gate_reads_current_state() {
        let store = store();
        assert!(create_comment(&store, comment_input("2", "1")).is_err());

        store.write().unwrap().posts_mut()[0].published = true;

        let comment = create_comment(&store, comment_input("2", "1")).unwrap();
        assert_eq!(comment.post, PostId::new("1"));
        assert_eq!(store.len(EntityKind::Comment).unwrap(), 5);
    }

    #[test]
    fn test_create_comment_on_new_published_post() {
        let store = store();
        let post = create_post(&store, post_input("1", true)).unwrap();
        let comment = create_comment(&store, comment_input("3", post.id.as_str())).unwrap();
        assert_eq!(comment.author, UserId::new("3"));
    }

    #[test]
    fn test_concurrent_create_user_same_email_single_winner() {
        let store = std::sync::Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || create_user(&store, user_input("race@x")).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.len(EntityKind::User).unwrap(), 4);
    }
}
