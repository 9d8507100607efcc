//! End-to-end tests of the engine through the executor
//!
//! These tests verify that:
//! - List filters are case-insensitive substring matches, identity when empty
//! - Mutations enforce uniqueness and referential integrity without partial writes
//! - The publish gate reads the current state of the store
//! - Responses contain exactly the selected fields
//! - The `me` and `post` stubs never change

use blog_graph::prelude::*;

fn executor() -> Executor {
    Executor::new(
        Arc::new(EntityStore::seeded().expect("demo seed is valid")),
        Arc::new(Schema::blog().expect("built-in schema compiles")),
    )
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("list result")
        .iter()
        .map(|item| item["id"].as_str().expect("id").to_string())
        .collect()
}

// =============================================================================
// Filter Engine
// =============================================================================

mod filter_tests {
    use super::*;

    #[test]
    fn test_post_filter_matches_body_only() {
        let result = executor()
            .execute(&OperationRequest::new("posts").argument("query", "Number").fields(["id"]))
            .unwrap();
        assert_eq!(ids(&result), vec!["2", "3"]);
    }

    #[test]
    fn test_empty_query_is_identity() {
        let executor = executor();
        let all = executor
            .execute(&OperationRequest::new("users").fields(["id"]))
            .unwrap();
        let empty = executor
            .execute(&OperationRequest::new("users").argument("query", "").fields(["id"]))
            .unwrap();
        assert_eq!(all, empty);
        assert_eq!(ids(&all), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_user_filter_is_case_insensitive() {
        let executor = executor();
        let upper = executor
            .execute(&OperationRequest::new("users").argument("query", "TREV").fields(["id"]))
            .unwrap();
        let lower = executor
            .execute(&OperationRequest::new("users").argument("query", "trev").fields(["id"]))
            .unwrap();
        assert_eq!(upper, lower);
        assert_eq!(ids(&upper), vec!["2"]);
    }

    #[test]
    fn test_post_matching_both_fields_appears_once() {
        let executor = executor();
        let matched = executor
            .execute(&OperationRequest::new("posts").argument("query", "graphql").fields(["id"]))
            .unwrap();
        // Post 1 matches on both title and body
        assert_eq!(ids(&matched), vec!["1"]);
    }
}

// =============================================================================
// Mutation Validator
// =============================================================================

mod mutation_tests {
    use super::*;

    #[test]
    fn test_duplicate_email_is_conflict_and_store_unchanged() {
        let executor = executor();
        let err = executor
            .execute(
                &OperationRequest::new("createUser")
                    .argument("data", json!({ "name": "Other Ash", "email": "ash@ash.ash" }))
                    .fields(["id"]),
            )
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Email taken");
        assert_eq!(executor.store().len(EntityKind::User).unwrap(), 3);
    }

    #[test]
    fn test_create_post_with_unknown_author_is_not_found() {
        let executor = executor();
        let err = executor
            .execute(
                &OperationRequest::new("createPost")
                    .argument(
                        "data",
                        json!({ "title": "T", "body": "B", "published": true, "author": "nonexistent-id" }),
                    )
                    .fields(["id"]),
            )
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "User not found");
        assert_eq!(executor.store().len(EntityKind::Post).unwrap(), 3);
    }

    #[test]
    fn test_create_comment_author_checked_before_post() {
        let executor = executor();
        let err = executor
            .execute(
                &OperationRequest::new("createComment")
                    .argument("data", json!({ "text": "Hi", "author": "ghost", "post": "ghost" }))
                    .fields(["id"]),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_publish_gate_uses_current_state() {
        let executor = executor();
        let comment_on = |post: &str| {
            OperationRequest::new("createComment")
                .argument("data", json!({ "text": "Nice", "author": "3", "post": post }))
                .fields(["text"])
                .field(FieldSelection::new("post").fields(["id", "published"]))
        };

        // Seeded posts are unpublished
        let err = executor.execute(&comment_on("2")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        // A newly published post accepts comments straight away
        let created = executor
            .execute(
                &OperationRequest::new("createPost")
                    .argument(
                        "data",
                        json!({ "title": "Live", "body": "Now", "published": true, "author": "3" }),
                    )
                    .fields(["id"]),
            )
            .unwrap();
        let post_id = created["id"].as_str().unwrap().to_string();

        let comment = executor.execute(&comment_on(post_id.as_str())).unwrap();
        assert_eq!(comment["post"], json!({ "id": post_id, "published": true }));
        assert_eq!(executor.store().len(EntityKind::Comment).unwrap(), 5);
    }

    #[test]
    fn test_created_post_round_trips_through_relationships() {
        let executor = executor();
        let created = executor
            .execute(
                &OperationRequest::new("createPost")
                    .argument(
                        "data",
                        json!({ "title": "Fresh", "body": "Ink", "published": false, "author": "3" }),
                    )
                    .fields(["id"])
                    .field(FieldSelection::new("author").fields(["id"])),
            )
            .unwrap();
        assert_eq!(created["author"]["id"], "3");

        let lauren = executor
            .execute(
                &OperationRequest::new("users")
                    .argument("query", "lauren")
                    .field(FieldSelection::new("posts").fields(["id", "title"])),
            )
            .unwrap();
        assert_eq!(
            lauren,
            json!([{ "posts": [{ "id": created["id"], "title": "Fresh" }] }])
        );
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let executor = executor();
        let mut seen = std::collections::HashSet::new();
        for i in 0..20 {
            let user = executor
                .execute(
                    &OperationRequest::new("createUser")
                        .argument("data", json!({ "name": "U", "email": format!("u{}@x", i) }))
                        .fields(["id"]),
                )
                .unwrap();
            assert!(seen.insert(user["id"].as_str().unwrap().to_string()));
        }
    }
}

// =============================================================================
// Request Executor
// =============================================================================

mod executor_tests {
    use super::*;

    #[test]
    fn test_sparse_fieldset_nested() {
        let result = executor()
            .execute(
                &OperationRequest::new("comments")
                    .fields(["id"])
                    .field(FieldSelection::new("author").fields(["name"]))
                    .field(
                        FieldSelection::new("post")
                            .fields(["title"])
                            .field(FieldSelection::new("comments").fields(["id"])),
                    ),
            )
            .unwrap();

        let last = &result[3];
        assert_eq!(
            last,
            &json!({
                "id": "3233",
                "author": { "name": "Lauren" },
                "post": {
                    "title": "Is REST dead?",
                    "comments": [{ "id": "2135" }, { "id": "1241" }, { "id": "3233" }]
                }
            })
        );
    }

    #[test]
    fn test_unselected_fields_are_absent() {
        let result = executor()
            .execute(&OperationRequest::new("users").argument("query", "ash").fields(["email"]))
            .unwrap();
        assert_eq!(result, json!([{ "email": "ash@ash.ash" }]));
    }

    #[test]
    fn test_stubs_are_byte_identical_across_calls() {
        let executor = executor();
        let me = OperationRequest::new("me").fields(["id", "name", "email", "age"]);
        let post = OperationRequest::new("post").fields(["id", "title", "body", "published"]);

        let first = (executor.execute(&me).unwrap(), executor.execute(&post).unwrap());

        executor
            .execute(
                &OperationRequest::new("createPost")
                    .argument(
                        "data",
                        json!({ "title": "GraphQL is cool", "body": "x", "published": true, "author": "1" }),
                    )
                    .fields(["id"]),
            )
            .unwrap();

        let second = (executor.execute(&me).unwrap(), executor.execute(&post).unwrap());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.1).unwrap(),
            r#"{"id":"aedfcb2131acb","title":"GraphQL is cool","body":"The best technology to master in 2018 is GraphQL. Lorem ipsum","published":true}"#
        );
    }

    #[test]
    fn test_dangling_reference_aborts_operation() {
        let err = executor()
            .execute(
                &OperationRequest::new("post").field(FieldSelection::new("author").fields(["id"])),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_response().code, "ENTITY_NOT_FOUND");
    }

    #[test]
    fn test_concurrent_reads_and_writes() {
        let executor = executor();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let executor = executor.clone();
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        executor
                            .execute(
                                &OperationRequest::new("createUser")
                                    .argument("data", json!({ "name": "Same", "email": "same@x" }))
                                    .fields(["id"]),
                            )
                            .is_ok()
                    } else {
                        executor
                            .execute(&OperationRequest::new("users").fields(["id"]))
                            .expect("reads never fail");
                        false
                    }
                })
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(created, 1);
        assert_eq!(executor.store().len(EntityKind::User).unwrap(), 4);
    }
}
