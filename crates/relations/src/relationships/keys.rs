//! Key Resolver - resolves explicit or convention-derived relation keys
//!
//! Every lookup checks that the attribute is declared on the model that is
//! supposed to carry it, so a schema mismatch fails when the relation boots
//! and never at query time.

use serde_json::Value;

use super::metadata::KeyPair;
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelInstance, ModelSchema};
use crate::value::KeyValue;

/// Resolve a local key on `model`, failing with `MissingLocalKey`
pub fn resolve_local_key(
    model: &ModelSchema,
    relation: &str,
    explicit: Option<&str>,
    default: &str,
) -> ModelResult<KeyPair> {
    let attribute = explicit.unwrap_or(default);
    model
        .column_for(attribute)
        .map(|column| KeyPair::new(attribute, column))
        .ok_or_else(|| ModelError::MissingLocalKey {
            model: model.name().to_string(),
            relation: relation.to_string(),
            key: attribute.to_string(),
        })
}

/// Resolve a foreign key on `model`, failing with `MissingForeignKey`
pub fn resolve_foreign_key(
    model: &ModelSchema,
    relation: &str,
    explicit: Option<&str>,
    default: &str,
) -> ModelResult<KeyPair> {
    let attribute = explicit.unwrap_or(default);
    model
        .column_for(attribute)
        .map(|column| KeyPair::new(attribute, column))
        .ok_or_else(|| ModelError::MissingForeignKey {
            model: model.name().to_string(),
            relation: relation.to_string(),
            key: attribute.to_string(),
        })
}

/// Read a parent's key value.
///
/// An attribute that was never loaded fails with `MissingLocalKeyValue`. A
/// `null` value resolves to `None`, which scopes the query to no rows.
pub fn parent_key_value(
    parent: &ModelInstance,
    relation: &str,
    key: &KeyPair,
) -> ModelResult<Option<KeyValue>> {
    match parent.attribute(&key.attribute) {
        Some(value) => Ok(KeyValue::from_json(value)),
        None => Err(ModelError::MissingLocalKeyValue {
            model: parent.model_name().to_string(),
            relation: relation.to_string(),
            key: key.attribute.clone(),
        }),
    }
}

/// One key value per parent, in parent order; `None` for a null key.
///
/// Fails on the first parent without the key attribute.
pub fn batch_key_values(
    parents: &[ModelInstance],
    relation: &str,
    key: &KeyPair,
) -> ModelResult<Vec<Option<KeyValue>>> {
    parents
        .iter()
        .map(|parent| parent_key_value(parent, relation, key))
        .collect()
}

/// Distinct non-null keys of a batch as bindings, in first-seen order
pub(crate) fn distinct_bindings(keys: &[Option<KeyValue>]) -> Vec<Value> {
    let mut seen = std::collections::HashSet::new();
    keys.iter()
        .flatten()
        .filter(|key| seen.insert((*key).clone()))
        .map(KeyValue::to_json)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> ModelSchema {
        ModelSchema::builder("User")
            .columns(["id", "email"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_local_key_defaults_and_adapter_column() {
        let schema = ModelSchema::builder("Post")
            .columns(["id", "userId"])
            .build()
            .unwrap();

        let key = resolve_foreign_key(&schema, "posts", None, "userId").unwrap();
        assert_eq!(key, KeyPair::new("userId", "user_id"));
    }

    #[test]
    fn test_missing_local_key_names_model() {
        let err = resolve_local_key(&user_schema(), "posts", Some("uuid"), "id").unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingLocalKey {
                model: "User".to_string(),
                relation: "posts".to_string(),
                key: "uuid".to_string(),
            }
        );
    }

    #[test]
    fn test_parent_key_value_distinguishes_null_from_absent() {
        let schema = user_schema();
        let key = KeyPair::new("id", "id");

        let with_null = ModelInstance::from_attributes(&schema, json!({"id": null}));
        assert_eq!(parent_key_value(&with_null, "posts", &key).unwrap(), None);

        let without = ModelInstance::from_attributes(&schema, json!({"email": "a@b.c"}));
        assert!(matches!(
            parent_key_value(&without, "posts", &key),
            Err(ModelError::MissingLocalKeyValue { .. })
        ));
    }

    #[test]
    fn test_batch_key_values_keep_one_slot_per_parent() {
        let schema = user_schema();
        let key = KeyPair::new("id", "id");
        let parents: Vec<ModelInstance> = [json!({"id": 1}), json!({"id": null}), json!({"id": 1})]
            .into_iter()
            .map(|attributes| ModelInstance::from_attributes(&schema, attributes))
            .collect();

        let keys = batch_key_values(&parents, "posts", &key).unwrap();
        assert_eq!(keys, vec![Some(KeyValue::from(1)), None, Some(KeyValue::from(1))]);
    }

    #[test]
    fn test_distinct_bindings_skip_nulls_and_duplicates() {
        let keys = vec![Some(KeyValue::from(1)), None, Some(KeyValue::from(2)), Some(KeyValue::from(1))];
        assert_eq!(distinct_bindings(&keys), vec![json!(1), json!(2)]);
    }
}
