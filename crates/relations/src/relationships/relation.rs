//! Relation - closed set of relation variants declared on a model

use serde_json::Value;

use super::belongs_to::BelongsTo;
use super::has_many::HasMany;
use super::has_many_through::HasManyThrough;
use super::has_one::HasOne;
use super::many_to_many::ManyToMany;
use super::traits::RelationContract;
use crate::backends::Database;
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelInstance, ModelRegistry, ModelSchema};

#[derive(Debug)]
pub enum Relation {
    HasOne(HasOne),
    HasMany(HasMany),
    BelongsTo(BelongsTo),
    ManyToMany(ManyToMany),
    HasManyThrough(HasManyThrough),
}

impl Relation {
    /// The variant as its capability contract
    pub fn contract(&self) -> &dyn RelationContract {
        match self {
            Relation::HasOne(relation) => relation,
            Relation::HasMany(relation) => relation,
            Relation::BelongsTo(relation) => relation,
            Relation::ManyToMany(relation) => relation,
            Relation::HasManyThrough(relation) => relation,
        }
    }

    pub fn name(&self) -> &str {
        self.contract().name()
    }

    /// Set the child's foreign key from the parent and insert it.
    ///
    /// Only `hasOne` and `hasMany` own a foreign key on the related row; every
    /// other kind fails with `RelationSaveUnsupported`.
    pub async fn save(
        &self,
        owner: &ModelSchema,
        registry: &ModelRegistry,
        parent: &ModelInstance,
        child: &mut ModelInstance,
        db: &Database,
    ) -> ModelResult<()> {
        match self {
            Relation::HasOne(relation) => relation.save(owner, registry, parent, child, db).await,
            Relation::HasMany(relation) => relation.save(owner, registry, parent, child, db).await,
            Relation::ManyToMany(relation) => relation.save(owner, registry, parent, child, db).await,
            Relation::HasManyThrough(relation) => relation.save(owner, registry, parent, child, db).await,
            Relation::BelongsTo(_) => Err(self.save_unsupported()),
        }
    }

    /// Build a related instance from attributes and save it
    pub async fn create(
        &self,
        owner: &ModelSchema,
        registry: &ModelRegistry,
        parent: &ModelInstance,
        attributes: Value,
        db: &Database,
    ) -> ModelResult<ModelInstance> {
        match self {
            Relation::HasOne(relation) => relation.create(owner, registry, parent, attributes, db).await,
            Relation::HasMany(relation) => relation.create(owner, registry, parent, attributes, db).await,
            Relation::ManyToMany(relation) => relation.create(owner, registry, parent, attributes, db).await,
            Relation::HasManyThrough(relation) => {
                relation.create(owner, registry, parent, attributes, db).await
            }
            Relation::BelongsTo(_) => Err(self.save_unsupported()),
        }
    }

    fn save_unsupported(&self) -> ModelError {
        let contract = self.contract();
        ModelError::RelationSaveUnsupported {
            relation: contract.name().to_string(),
            kind: contract.relation_type().to_string(),
        }
    }
}

impl From<HasOne> for Relation {
    fn from(relation: HasOne) -> Self {
        Relation::HasOne(relation)
    }
}

impl From<HasMany> for Relation {
    fn from(relation: HasMany) -> Self {
        Relation::HasMany(relation)
    }
}

impl From<BelongsTo> for Relation {
    fn from(relation: BelongsTo) -> Self {
        Relation::BelongsTo(relation)
    }
}

impl From<ManyToMany> for Relation {
    fn from(relation: ManyToMany) -> Self {
        Relation::ManyToMany(relation)
    }
}

impl From<HasManyThrough> for Relation {
    fn from(relation: HasManyThrough) -> Self {
        Relation::HasManyThrough(relation)
    }
}
