//! Substring filters for list queries
//!
//! A query matches a field when the lowercased field contains the
//! lowercased query. An absent or empty query keeps every record.
//! Filtering is stable: matches keep their input order.

use crate::core::entity::{Post, User};

/// Records that can be matched against a free-text query
pub trait Searchable {
    /// Whether any searchable field contains `needle` (already lowercased)
    fn matches(&self, needle: &str) -> bool;
}

impl Searchable for User {
    fn matches(&self, needle: &str) -> bool {
        contains_lowered(&self.name, needle)
    }
}

impl Searchable for Post {
    fn matches(&self, needle: &str) -> bool {
        contains_lowered(&self.title, needle) || contains_lowered(&self.body, needle)
    }
}

fn contains_lowered(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Keep the records matching `query`, in input order
pub fn filter_by_query<T>(records: &[T], query: Option<&str>) -> Vec<T>
where
    T: Searchable + Clone,
{
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return records.to_vec();
    };

    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| record.matches(&needle))
        .cloned()
        .collect()
}

/// Users whose name contains `query`
pub fn match_users(users: &[User], query: Option<&str>) -> Vec<User> {
    filter_by_query(users, query)
}

/// Posts whose title or body contains `query`
pub fn match_posts(posts: &[Post], query: Option<&str>) -> Vec<Post> {
    filter_by_query(posts, query)
}
