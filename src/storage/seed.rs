//! Seed data loaded into the entity store at process start

use crate::core::entity::{Comment, CommentId, Post, PostId, User, UserId};
use crate::core::error::{BlogResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Initial contents of the three collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,

    #[serde(default)]
    pub posts: Vec<Post>,

    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl SeedData {
    /// Load seed data from a YAML file
    pub fn from_yaml_file(path: &str) -> BlogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Load seed data from a YAML string
    pub fn from_yaml_str(yaml: &str) -> BlogResult<Self> {
        Self::parse(yaml, "<inline>")
    }

    fn parse(yaml: &str, origin: &str) -> BlogResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::Load {
                path: origin.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Check id uniqueness and foreign-key existence
    pub fn check(&self) -> BlogResult<()> {
        let user_ids = unique_ids("User", self.users.iter().map(|u| u.id.as_str()))?;
        let post_ids = unique_ids("Post", self.posts.iter().map(|p| p.id.as_str()))?;
        unique_ids("Comment", self.comments.iter().map(|c| c.id.as_str()))?;

        let mut emails = HashSet::new();
        for user in &self.users {
            if !emails.insert(user.email.as_str()) {
                return Err(invalid(format!("Duplicate User email '{}'", user.email)));
            }
        }

        for post in &self.posts {
            if !user_ids.contains(post.author.as_str()) {
                return Err(invalid(format!(
                    "Post '{}' references unknown author '{}'",
                    post.id, post.author
                )));
            }
        }

        for comment in &self.comments {
            if !user_ids.contains(comment.author.as_str()) {
                return Err(invalid(format!(
                    "Comment '{}' references unknown author '{}'",
                    comment.id, comment.author
                )));
            }
            if !post_ids.contains(comment.post.as_str()) {
                return Err(invalid(format!(
                    "Comment '{}' references unknown post '{}'",
                    comment.id, comment.post
                )));
            }
        }

        Ok(())
    }

    /// The demo records the server starts with
    pub fn demo() -> Self {
        let user = |id: &str, name: &str, email: &str, age: i64| User {
            id: UserId::new(id),
            name: name.to_string(),
            email: email.to_string(),
            age: Some(age),
        };
        let post = |id: &str, title: &str, body: &str, author: &str| Post {
            id: PostId::new(id),
            title: title.to_string(),
            body: body.to_string(),
            published: false,
            author: UserId::new(author),
        };
        let comment = |id: &str, text: &str, author: &str, post: &str| Comment {
            id: CommentId::new(id),
            text: text.to_string(),
            author: UserId::new(author),
            post: PostId::new(post),
        };

        Self {
            users: vec![
                user("1", "Ash", "ash@ash.ash", 25),
                user("2", "Trevor", "trevor@trevor.trevor", 37),
                user("3", "Lauren", "lauren@lauren.lauren", 24),
            ],
            posts: vec![
                post(
                    "1",
                    "GraphQL is cool",
                    "Breakthrough in technology. GraphQL is the coolest.",
                    "1",
                ),
                post(
                    "2",
                    "Is REST dead?",
                    "The number  of services using REST API drops sharply.",
                    "1",
                ),
                post(
                    "3",
                    "React still popular",
                    "After 5 years tech giant open sourced React.js a popular view library for building web applications, it remains the number one choice for developers.",
                    "2",
                ),
            ],
            comments: vec![
                comment("2141", "Lorem ipsum dolor sit amet.", "1", "1"),
                comment("2135", "Of course you are right. Amazing article.", "1", "2"),
                comment("1241", "I can't wait for the GraphQL release.", "2", "2"),
                comment("3233", "Unbelievable. I totally missed it.", "3", "2"),
            ],
        }
    }
}

fn unique_ids<'a>(
    entity: &str,
    ids: impl Iterator<Item = &'a str>,
) -> BlogResult<HashSet<&'a str>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(invalid(format!("Duplicate {} id '{}'", entity, id)));
        }
    }
    Ok(seen)
}

fn invalid(message: String) -> crate::core::error::BlogError {
    ConfigError::InvalidSeed { message }.into()
}
