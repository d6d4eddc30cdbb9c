//! Shared blog schema and canned rows for the integration tests

#![allow(dead_code)]

use elif_relations::relationships::{BelongsToOptions, HasManyOptions, HasOneOptions, ManyToManyOptions};
use elif_relations::testing::RecordingConnection;
use elif_relations::{Database, ModelRegistry, ModelSchema, PreloadConfig, RelationsConfig};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// User, Post, Comment, Profile and Skill with their relations
pub fn blog_registry() -> ModelRegistry {
    let registry = ModelRegistry::new();
    registry.register(
        ModelSchema::builder("User")
            .columns(["id", "name"])
            .has_many("posts", HasManyOptions::new("Post"))
            .has_one("profile", HasOneOptions::new("Profile"))
            .many_to_many("skills", ManyToManyOptions::new("Skill"))
            .build()
            .unwrap(),
    );
    registry.register(
        ModelSchema::builder("Post")
            .columns(["id", "userId", "title"])
            .has_many("comments", HasManyOptions::new("Comment"))
            .belongs_to("author", BelongsToOptions::new("User"))
            .build()
            .unwrap(),
    );
    registry.register(
        ModelSchema::builder("Comment")
            .columns(["id", "postId", "body"])
            .build()
            .unwrap(),
    );
    registry.register(
        ModelSchema::builder("Profile")
            .columns(["id", "userId", "bio"])
            .build()
            .unwrap(),
    );
    registry.register(ModelSchema::builder("Skill").columns(["id", "name"]).build().unwrap());
    registry
}

/// Two users: user 1 has posts 1 and 2, user 2 has post 3
pub fn seeded_connection(name: &str) -> RecordingConnection {
    RecordingConnection::new(name)
        .with_rows(
            "users",
            vec![json!({"id": 1, "name": "Virk"}), json!({"id": 2, "name": "Romain"})],
        )
        .with_rows(
            "posts",
            vec![
                json!({"id": 1, "user_id": 1, "title": "Relations"}),
                json!({"id": 3, "user_id": 2, "title": "Preloads"}),
                json!({"id": 2, "user_id": 1, "title": "Queries"}),
            ],
        )
        .with_rows(
            "comments",
            vec![
                json!({"id": 10, "post_id": 1, "body": "first"}),
                json!({"id": 11, "post_id": 3, "body": "second"}),
                json!({"id": 12, "post_id": 1, "body": "third"}),
            ],
        )
        .with_rows("profiles", vec![json!({"id": 5, "user_id": 2, "bio": "Writes docs"})])
        .with_rows(
            "skills",
            vec![json!({"id": 7, "name": "Rust", "pivot_user_id": 1, "pivot_skill_id": 7})],
        )
}

/// Route crate logs to the test writer, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn database(connection: &RecordingConnection) -> Database {
    init_tracing();
    Database::new().with_connection("primary", connection.clone())
}

pub fn concurrent_database(connection: &RecordingConnection) -> Database {
    init_tracing();
    let config = RelationsConfig {
        preload: PreloadConfig {
            concurrent_siblings: true,
            ..PreloadConfig::default()
        },
        ..RelationsConfig::default()
    };
    Database::with_config(config).with_connection("primary", connection.clone())
}
