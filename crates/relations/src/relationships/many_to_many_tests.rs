//! Tests for manyToMany pivot resolution, queries and attach

use pretty_assertions::assert_eq;
use serde_json::json;

use super::{ManyToManyOptions, RelationContract};
use crate::backends::Database;
use crate::error::ModelError;
use crate::loading::Preloader;
use crate::model::{ModelInstance, ModelRegistry, ModelSchema};
use crate::testing::RecordingConnection;

fn registry() -> ModelRegistry {
    let registry = ModelRegistry::new();
    registry.register(
        ModelSchema::builder("User")
            .columns(["id", "name"])
            .many_to_many("skills", ManyToManyOptions::new("Skill"))
            .many_to_many(
                "badges",
                ManyToManyOptions::new("Skill")
                    .pivot_table("user_badges")
                    .pivot_foreign_key("owner_id")
                    .pivot_related_foreign_key("badge_id"),
            )
            .build()
            .unwrap(),
    );
    registry.register(ModelSchema::builder("Skill").columns(["id", "name"]).build().unwrap());
    registry
}

fn users(registry: &ModelRegistry, ids: &[i64]) -> Vec<ModelInstance> {
    let schema = registry.get("User").unwrap();
    ids.iter()
        .map(|id| {
            let mut user = ModelInstance::from_attributes(&schema, json!({"id": id}));
            user.mark_persisted();
            user
        })
        .collect()
}

#[test]
fn test_pivot_defaults_follow_model_names() {
    let registry = registry();
    let schema = registry.get("User").unwrap();
    let skills = schema.require_relation("skills").unwrap().contract();

    let definition = skills.boot(&schema, &registry).unwrap();
    let pivot = definition.pivot.as_ref().unwrap();
    assert_eq!(pivot.table, "skill_user");
    assert_eq!(pivot.foreign_key, "user_id");
    assert_eq!(pivot.related_foreign_key, "skill_id");
    assert_eq!(pivot.related_key.column, "id");
}

#[test]
fn test_eager_query_joins_pivot_before_scoping() {
    let registry = registry();
    let db = Database::new().with_connection("primary", RecordingConnection::new("primary"));
    let schema = registry.get("User").unwrap();
    let parents = users(&registry, &[1, 2]);

    let query = schema
        .require_relation("skills")
        .unwrap()
        .contract()
        .get_eager_query(&schema, &registry, &parents, db.client(parents[0].options()).unwrap())
        .unwrap();

    assert_eq!(
        query.to_sql(),
        "SELECT skills.*, skill_user.user_id AS pivot_user_id, skill_user.skill_id AS pivot_skill_id \
         FROM skills INNER JOIN skill_user ON skills.id = skill_user.skill_id \
         WHERE skill_user.user_id IN (1, 2)"
    );
}

#[test]
fn test_self_referencing_pivot_needs_distinct_columns() {
    let registry = ModelRegistry::new();
    registry.register(
        ModelSchema::builder("User")
            .columns(["id", "name"])
            .many_to_many("friends", ManyToManyOptions::new("User"))
            .many_to_many(
                "followers",
                ManyToManyOptions::new("User")
                    .pivot_table("follows")
                    .pivot_foreign_key("followed_id")
                    .pivot_related_foreign_key("follower_id"),
            )
            .build()
            .unwrap(),
    );
    let schema = registry.get("User").unwrap();

    let friends = schema.require_relation("friends").unwrap().contract();
    assert!(matches!(
        friends.boot(&schema, &registry),
        Err(ModelError::Schema(message)) if message.contains("user_id")
    ));
    assert!(!friends.is_booted());

    let db = Database::new().with_connection("primary", RecordingConnection::new("primary"));
    let parent = users(&registry, &[1]).remove(0);
    let query = schema
        .require_relation("followers")
        .unwrap()
        .contract()
        .get_query(&schema, &registry, &parent, db.client(parent.options()).unwrap())
        .unwrap();
    assert_eq!(
        query.to_sql(),
        "SELECT users.*, follows.followed_id AS pivot_followed_id, follows.follower_id AS pivot_follower_id \
         FROM users INNER JOIN follows ON users.id = follows.follower_id \
         WHERE follows.followed_id = 1"
    );
}

#[test]
fn test_explicit_pivot_columns() {
    let registry = registry();
    let db = Database::new().with_connection("primary", RecordingConnection::new("primary"));
    let schema = registry.get("User").unwrap();
    let parent = users(&registry, &[3]).remove(0);

    let query = schema
        .require_relation("badges")
        .unwrap()
        .contract()
        .get_query(&schema, &registry, &parent, db.client(parent.options()).unwrap())
        .unwrap();

    assert_eq!(
        query.to_sql(),
        "SELECT skills.*, user_badges.owner_id AS pivot_owner_id, user_badges.badge_id AS pivot_badge_id \
         FROM skills INNER JOIN user_badges ON skills.id = user_badges.badge_id \
         WHERE user_badges.owner_id = 3"
    );
}

#[tokio::test]
async fn test_preload_groups_by_pivot_column() {
    let registry = registry();
    let connection = RecordingConnection::new("primary").with_rows(
        "skills",
        vec![
            json!({"id": 10, "name": "Rust", "pivot_user_id": 1, "pivot_skill_id": 10}),
            json!({"id": 11, "name": "SQL", "pivot_user_id": 1, "pivot_skill_id": 11}),
            json!({"id": 10, "name": "Rust", "pivot_user_id": 2, "pivot_skill_id": 10}),
        ],
    );
    let db = Database::new().with_connection("primary", connection.clone());
    let schema = registry.get("User").unwrap();
    let mut parents = users(&registry, &[1, 2]);

    Preloader::new()
        .preload("skills")
        .run(&schema, &registry, &mut parents, &db)
        .await
        .unwrap();

    let names = |user: &ModelInstance| -> Vec<serde_json::Value> {
        user.related("skills")
            .unwrap()
            .iter()
            .map(|skill| skill.attribute("name").cloned().unwrap())
            .collect()
    };
    assert_eq!(names(&parents[0]), vec![json!("Rust"), json!("SQL")]);
    assert_eq!(names(&parents[1]), vec![json!("Rust")]);

    let skill = &parents[1].related("skills").unwrap().as_many()[0];
    assert_eq!(skill.extra("pivot_user_id"), Some(&json!(2)));
    assert_eq!(connection.queries_for("skills").len(), 1);
}

#[tokio::test]
async fn test_attach_inserts_pivot_rows() {
    let registry = registry();
    let connection = RecordingConnection::new("primary");
    let db = Database::new().with_connection("primary", connection.clone());
    let schema = registry.get("User").unwrap();
    let parent = users(&registry, &[7]).remove(0);

    let relation = match schema.require_relation("skills").unwrap() {
        super::Relation::ManyToMany(relation) => relation,
        other => panic!("unexpected relation {:?}", other),
    };
    let inserted = relation
        .attach(&schema, &registry, &parent, vec![10, 11], &db)
        .await
        .unwrap();

    assert_eq!(inserted, 2);
    let queries = connection.queries_for("skill_user");
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].sql, "INSERT INTO skill_user (user_id, skill_id) VALUES ($1, $2)");
    assert_eq!(queries[1].bindings, vec![json!(7), json!(11)]);
}

#[tokio::test]
async fn test_save_and_create_are_unsupported() {
    let registry = registry();
    let db = Database::new().with_connection("primary", RecordingConnection::new("primary"));
    let schema = registry.get("User").unwrap();
    let parent = users(&registry, &[1]).remove(0);
    let relation = schema.require_relation("skills").unwrap();

    let mut skill = ModelInstance::from_attributes(&registry.get("Skill").unwrap(), json!({"name": "Go"}));
    let saved = relation.save(&schema, &registry, &parent, &mut skill, &db).await;
    let created = relation.create(&schema, &registry, &parent, json!({"name": "Go"}), &db).await;

    for result in [saved.map(|_| ()), created.map(|_| ())] {
        assert!(matches!(
            result,
            Err(ModelError::RelationSaveUnsupported { ref kind, .. }) if kind == "manyToMany"
        ));
    }
}
