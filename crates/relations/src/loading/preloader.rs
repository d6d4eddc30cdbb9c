//! Preloader - batched, depth-ordered loading of relation trees
//!
//! Execution runs one depth at a time. Every query of a depth is built from
//! the instances fetched at the depth above and completes before the next
//! depth is built. Fetched instances stay in an arena until the whole tree
//! has loaded; attachment then walks the arena backwards, so children are
//! attached to their parents before those parents are attached in turn. A
//! failure at any depth therefore leaves every parent untouched.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, warn};

use super::tree::{PreloadNode, PreloadTree};
use crate::backends::Database;
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelInstance, ModelRegistry, ModelSchema, Preloaded};
use crate::relationships::{
    keys::batch_key_values, GroupKey, GroupedResult, RelationQueryBuilder, RelationScope, RelationType,
};
use crate::value::KeyValue;

/// Counters for one preload run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadStats {
    /// Queries issued
    pub query_count: usize,
    /// Related instances fetched
    pub records_loaded: usize,
    /// Depths executed
    pub depth_loaded: usize,
}

/// Registers preload paths and runs them over a batch of parents
#[derive(Debug, Clone, Default)]
pub struct Preloader {
    tree: PreloadTree,
    invalid_path: Option<ModelError>,
}

/// A node waiting for its depth to execute
struct PendingNode<'t> {
    node: &'t PreloadNode,
    /// Arena index of the node whose instances are the parents; `None` for the root batch
    parent_index: Option<usize>,
    owner: Arc<ModelSchema>,
}

/// A node whose query has run
struct LoadedNode {
    relation: String,
    relation_type: RelationType,
    parent_index: Option<usize>,
    related: Vec<ModelInstance>,
    /// For each parent position, indices into `related`
    assignments: Vec<Vec<usize>>,
}

impl Preloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dotted path
    pub fn preload(self, path: &str) -> Self {
        self.register(path, None)
    }

    /// Register a dotted path with a scope for its last relation
    pub fn preload_with<F>(self, path: &str, scope: F) -> Self
    where
        F: Fn(RelationQueryBuilder) -> RelationQueryBuilder + Send + Sync + 'static,
    {
        self.register(path, Some(Arc::new(scope)))
    }

    fn register(mut self, path: &str, scope: Option<RelationScope>) -> Self {
        if let Err(err) = self.tree.insert(path, scope) {
            // The first invalid path is reported when the preloader runs
            self.invalid_path.get_or_insert(err);
        }
        self
    }

    pub fn tree(&self) -> &PreloadTree {
        &self.tree
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Load the registered tree onto `parents`
    pub async fn run(
        &self,
        schema: &Arc<ModelSchema>,
        registry: &ModelRegistry,
        parents: &mut [ModelInstance],
        db: &Database,
    ) -> ModelResult<PreloadStats> {
        if let Some(err) = &self.invalid_path {
            return Err(err.clone());
        }
        if self.tree.is_empty() {
            return Ok(PreloadStats::default());
        }

        let max_depth = db.preload_config().max_depth;
        if self.tree.depth() > max_depth {
            warn!(depth = self.tree.depth(), max_depth, "preload path exceeds maximum depth");
            return Err(ModelError::InvalidPreloadPath(format!(
                "preload depth {} exceeds the maximum of {}",
                self.tree.depth(),
                max_depth
            )));
        }

        validate_nodes(self.tree.roots(), schema, registry)?;

        let mut stats = PreloadStats::default();
        let arena = self.load_depths(schema, registry, parents, db, &mut stats).await?;
        attach(arena, parents);

        Ok(stats)
    }

    async fn load_depths(
        &self,
        schema: &Arc<ModelSchema>,
        registry: &ModelRegistry,
        roots: &[ModelInstance],
        db: &Database,
        stats: &mut PreloadStats,
    ) -> ModelResult<Vec<LoadedNode>> {
        let concurrent = db.preload_config().concurrent_siblings;
        let mut arena: Vec<LoadedNode> = Vec::new();
        let mut level: Vec<PendingNode<'_>> = self
            .tree
            .roots()
            .iter()
            .map(|node| PendingNode {
                node,
                parent_index: None,
                owner: Arc::clone(schema),
            })
            .collect();
        let mut depth = 0;

        while !level.is_empty() {
            depth += 1;

            // Build every query of this depth before running any of them
            let mut queries = Vec::with_capacity(level.len());
            let mut batch_keys = Vec::with_capacity(level.len());
            let mut parent_count = 0;
            for pending in &level {
                let parents: &[ModelInstance] = match pending.parent_index {
                    Some(index) => &arena[index].related,
                    None => roots,
                };
                parent_count += parents.len();
                let (query, keys) = build_eager_query(pending, registry, parents, db)?;
                queries.push(query);
                batch_keys.push(keys);
            }

            let issued = queries.iter().filter(|q| q.is_some()).count();
            debug!(
                depth,
                nodes = level.len(),
                parents = parent_count,
                queries = issued,
                concurrent,
                "running preload depth"
            );

            let results = if concurrent {
                try_join_all(queries.into_iter().map(fetch_optional)).await?
            } else {
                let mut results = Vec::with_capacity(queries.len());
                for query in queries {
                    results.push(fetch_optional(query).await?);
                }
                results
            };
            stats.query_count += issued;
            stats.depth_loaded = depth;

            let mut next = Vec::new();
            for ((pending, keys), related) in level.into_iter().zip(batch_keys).zip(results) {
                let relation = pending.owner.require_relation(pending.node.name())?.contract();
                let definition = relation.boot(&pending.owner, registry)?;
                let group_key = relation.group_key(definition);

                let assignments = assign(&related, &keys, &group_key, relation.name())?;
                stats.records_loaded += related.len();

                let related_schema = registry.get(relation.related_model())?;
                let index = arena.len();
                arena.push(LoadedNode {
                    relation: relation.name().to_string(),
                    relation_type: relation.relation_type(),
                    parent_index: pending.parent_index,
                    related,
                    assignments,
                });

                for child in pending.node.children() {
                    next.push(PendingNode {
                        node: child,
                        parent_index: Some(index),
                        owner: Arc::clone(&related_schema),
                    });
                }
            }

            level = next;
        }

        Ok(arena)
    }
}

/// Fail on unknown relations and boot errors before any query is issued
fn validate_nodes(nodes: &[PreloadNode], owner: &ModelSchema, registry: &ModelRegistry) -> ModelResult<()> {
    for node in nodes {
        let relation = owner.require_relation(node.name())?.contract();
        relation.boot(owner, registry)?;
        if !node.children().is_empty() {
            let related = registry.get(relation.related_model())?;
            validate_nodes(node.children(), &related, registry)?;
        }
    }
    Ok(())
}

/// The scoped eager query for one node, or `None` when no parent has a key
fn build_eager_query(
    pending: &PendingNode<'_>,
    registry: &ModelRegistry,
    parents: &[ModelInstance],
    db: &Database,
) -> ModelResult<(Option<RelationQueryBuilder>, Vec<Option<KeyValue>>)> {
    let relation = pending.owner.require_relation(pending.node.name())?.contract();
    let definition = relation.boot(&pending.owner, registry)?;
    let keys = batch_key_values(parents, relation.name(), relation.parent_key(definition))?;

    let first = match parents.first() {
        Some(first) if keys.iter().any(Option::is_some) => first,
        _ => return Ok((None, keys)),
    };

    // The batch runs with the options its parents were loaded with
    let client = db.client(first.options())?;
    let query = relation
        .get_eager_query(&pending.owner, registry, parents, client)?
        .apply_scope(pending.node.scope());
    query.ensure_group_key_selected()?;

    Ok((Some(query), keys))
}

async fn fetch_optional(query: Option<RelationQueryBuilder>) -> ModelResult<Vec<ModelInstance>> {
    match query {
        Some(query) => query.fetch().await,
        None => Ok(Vec::new()),
    }
}

/// Map each parent position to the related instances sharing its key
fn assign(
    related: &[ModelInstance],
    parent_keys: &[Option<KeyValue>],
    group_key: &GroupKey,
    relation: &str,
) -> ModelResult<Vec<Vec<usize>>> {
    let groups = GroupedResult::try_group_by(0..related.len(), |index| {
        match group_key.value_of(&related[*index]) {
            Some(value) => Ok(KeyValue::from_json(value)),
            None => Err(ModelError::MissingSelectedKey {
                relation: relation.to_string(),
                key: group_key.output_column().to_string(),
            }),
        }
    })?;

    Ok(parent_keys
        .iter()
        .map(|key| match key {
            Some(key) => groups.get(key).map(<[usize]>::to_vec).unwrap_or_default(),
            None => Vec::new(),
        })
        .collect())
}

/// Write every relation slot, deepest nodes first
fn attach(mut arena: Vec<LoadedNode>, roots: &mut [ModelInstance]) {
    for index in (0..arena.len()).rev() {
        let related = std::mem::take(&mut arena[index].related);
        let assignments = std::mem::take(&mut arena[index].assignments);
        let relation = arena[index].relation.clone();
        let is_collection = arena[index].relation_type.is_collection();
        let parent_index = arena[index].parent_index;

        let parents: &mut [ModelInstance] = match parent_index {
            Some(parent) => &mut arena[parent].related,
            None => &mut *roots,
        };

        for (parent, indices) in parents.iter_mut().zip(assignments) {
            let slot = if is_collection {
                Preloaded::Many(indices.iter().map(|i| related[*i].clone()).collect())
            } else {
                Preloaded::One(indices.first().map(|i| Box::new(related[*i].clone())))
            };
            parent.set_related(&relation, slot);
        }
    }
}
