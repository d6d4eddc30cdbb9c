//! Tests for hasManyThrough key resolution, join queries and read-only saves

use pretty_assertions::assert_eq;
use serde_json::json;

use super::{HasManyOptions, HasManyThroughOptions, RelationContract};
use crate::backends::Database;
use crate::error::ModelError;
use crate::loading::Preloader;
use crate::model::{ModelInstance, ModelRegistry, ModelSchema};
use crate::query::QueryBuilder;
use crate::testing::RecordingConnection;

fn registry() -> ModelRegistry {
    let registry = ModelRegistry::new();
    registry.register(
        ModelSchema::builder("Country")
            .columns(["id", "name"])
            .has_many_through("posts", HasManyThroughOptions::new("Post", "User"))
            .has_many("users", HasManyOptions::new("User"))
            .build()
            .unwrap(),
    );
    registry.register(
        ModelSchema::builder("User")
            .columns(["id", "countryId", "name"])
            .build()
            .unwrap(),
    );
    registry.register(
        ModelSchema::builder("Post")
            .columns(["id", "userId", "title"])
            .build()
            .unwrap(),
    );
    registry
}

fn countries(registry: &ModelRegistry, ids: &[i64]) -> Vec<ModelInstance> {
    let schema = registry.get("Country").unwrap();
    ids.iter()
        .map(|id| ModelInstance::from_attributes(&schema, json!({"id": id})))
        .collect()
}

#[test]
fn test_through_keys_resolve_by_convention() {
    let registry = registry();
    let schema = registry.get("Country").unwrap();
    let definition = schema
        .require_relation("posts")
        .unwrap()
        .contract()
        .boot(&schema, &registry)
        .unwrap();

    assert_eq!(definition.local_key.attribute, "id");
    assert_eq!(definition.foreign_key.attribute, "countryId");
    assert_eq!(definition.foreign_key.column, "country_id");

    let through = definition.through.as_ref().unwrap();
    assert_eq!(through.through_table, "users");
    assert_eq!(through.through_local_key.attribute, "id");
    assert_eq!(through.through_foreign_key.attribute, "userId");
    assert_eq!(through.through_foreign_key.column, "user_id");
}

#[test]
fn test_missing_through_foreign_key_fails_boot() {
    let registry = registry();
    registry.register(ModelSchema::builder("Member").columns(["id"]).build().unwrap());
    let schema = registry.register(
        ModelSchema::builder("Region")
            .columns(["id"])
            .has_many_through("posts", HasManyThroughOptions::new("Post", "Member"))
            .build()
            .unwrap(),
    );

    let err = schema
        .require_relation("posts")
        .unwrap()
        .contract()
        .boot(&schema, &registry)
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::MissingForeignKey {
            model: "Member".to_string(),
            relation: "posts".to_string(),
            key: "regionId".to_string(),
        }
    );
}

#[test]
fn test_missing_related_foreign_key_fails_boot() {
    let registry = registry();
    registry.register(ModelSchema::builder("Comment").columns(["id", "body"]).build().unwrap());
    let schema = registry.register(
        ModelSchema::builder("Continent")
            .columns(["id"])
            .has_many_through("comments", HasManyThroughOptions::new("Comment", "User").foreign_key("countryId"))
            .build()
            .unwrap(),
    );

    let err = schema
        .require_relation("comments")
        .unwrap()
        .contract()
        .boot(&schema, &registry)
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::MissingForeignKey { ref model, ref key, .. } if model == "Comment" && key == "userId"
    ));
}

#[test]
fn test_single_parent_query_joins_then_scopes() {
    let registry = registry();
    let db = Database::new().with_connection("primary", RecordingConnection::new("primary"));
    let schema = registry.get("Country").unwrap();
    let parent = countries(&registry, &[1]).remove(0);

    let query = schema
        .require_relation("posts")
        .unwrap()
        .contract()
        .get_query(&schema, &registry, &parent, db.client(parent.options()).unwrap())
        .unwrap();

    let expected = QueryBuilder::table("posts")
        .select("posts.*, users.country_id AS through_country_id")
        .join("users", "users.id", "posts.user_id")
        .where_eq("users.country_id", 1);
    assert_eq!(query.to_sql(), expected.to_sql());
}

#[test]
fn test_eager_query_filters_on_through_table() {
    let registry = registry();
    let db = Database::new().with_connection("primary", RecordingConnection::new("primary"));
    let schema = registry.get("Country").unwrap();
    let parents = countries(&registry, &[1, 2, 1]);

    let query = schema
        .require_relation("posts")
        .unwrap()
        .contract()
        .get_eager_query(&schema, &registry, &parents, db.client(parents[0].options()).unwrap())
        .unwrap();

    assert_eq!(
        query.to_sql(),
        "SELECT posts.*, users.country_id AS through_country_id FROM posts \
         INNER JOIN users ON users.id = posts.user_id WHERE users.country_id IN (1, 2)"
    );
}

#[tokio::test]
async fn test_preload_groups_by_through_column() {
    let registry = registry();
    let connection = RecordingConnection::new("primary").with_rows(
        "posts",
        vec![
            json!({"id": 1, "user_id": 5, "title": "a", "through_country_id": 2}),
            json!({"id": 2, "user_id": 6, "title": "b", "through_country_id": 1}),
            json!({"id": 3, "user_id": 5, "title": "c", "through_country_id": 2}),
        ],
    );
    let db = Database::new().with_connection("primary", connection.clone());
    let schema = registry.get("Country").unwrap();
    let mut parents = countries(&registry, &[1, 2, 3]);

    let stats = Preloader::new()
        .preload("posts")
        .run(&schema, &registry, &mut parents, &db)
        .await
        .unwrap();

    assert_eq!(stats.query_count, 1);
    assert_eq!(stats.records_loaded, 3);
    assert_eq!(parents[0].related("posts").unwrap().len(), 1);
    assert_eq!(parents[1].related("posts").unwrap().len(), 2);
    assert!(parents[2].related("posts").unwrap().is_empty());
    for post in parents[1].related("posts").unwrap().iter() {
        assert_eq!(post.extra("through_country_id"), Some(&json!(2)));
    }
}

#[tokio::test]
async fn test_save_and_create_always_fail() {
    let registry = registry();
    let connection = RecordingConnection::new("primary");
    let db = Database::new().with_connection("primary", connection.clone());
    let schema = registry.get("Country").unwrap();
    let relation = schema.require_relation("posts").unwrap();
    let post_schema = registry.get("Post").unwrap();

    // Parents with and without keys fail the same way
    for parent in [
        ModelInstance::from_attributes(&schema, json!({"id": 1})),
        ModelInstance::from_attributes(&schema, json!({})),
    ] {
        let mut post = ModelInstance::from_attributes(&post_schema, json!({"title": "x"}));
        let saved = relation.save(&schema, &registry, &parent, &mut post, &db).await;
        assert!(matches!(
            saved,
            Err(ModelError::RelationSaveUnsupported { ref kind, .. }) if kind == "hasManyThrough"
        ));

        let created = relation.create(&schema, &registry, &parent, json!(null), &db).await;
        assert!(matches!(
            created,
            Err(ModelError::RelationSaveUnsupported { ref relation, .. }) if relation == "posts"
        ));
    }
    assert_eq!(connection.query_count(), 0);
}
