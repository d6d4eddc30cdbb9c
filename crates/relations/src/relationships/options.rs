//! Declaration options for relations
//!
//! Every key is optional; anything left out is derived from the naming
//! strategy when the relation boots.

/// Options for `hasOne`, `hasMany` and `belongsTo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationOptions {
    pub related_model: String,
    pub local_key: Option<String>,
    pub foreign_key: Option<String>,
}

pub type HasOneOptions = RelationOptions;
pub type HasManyOptions = RelationOptions;
pub type BelongsToOptions = RelationOptions;

impl RelationOptions {
    pub fn new(related_model: &str) -> Self {
        Self {
            related_model: related_model.to_string(),
            local_key: None,
            foreign_key: None,
        }
    }

    pub fn local_key(mut self, key: &str) -> Self {
        self.local_key = Some(key.to_string());
        self
    }

    pub fn foreign_key(mut self, key: &str) -> Self {
        self.foreign_key = Some(key.to_string());
        self
    }
}

/// Options for `manyToMany`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManyToManyOptions {
    pub related_model: String,
    pub local_key: Option<String>,
    pub related_key: Option<String>,
    pub pivot_table: Option<String>,
    pub pivot_foreign_key: Option<String>,
    pub pivot_related_foreign_key: Option<String>,
}

impl ManyToManyOptions {
    pub fn new(related_model: &str) -> Self {
        Self {
            related_model: related_model.to_string(),
            local_key: None,
            related_key: None,
            pivot_table: None,
            pivot_foreign_key: None,
            pivot_related_foreign_key: None,
        }
    }

    pub fn local_key(mut self, key: &str) -> Self {
        self.local_key = Some(key.to_string());
        self
    }

    pub fn related_key(mut self, key: &str) -> Self {
        self.related_key = Some(key.to_string());
        self
    }

    pub fn pivot_table(mut self, table: &str) -> Self {
        self.pivot_table = Some(table.to_string());
        self
    }

    /// Pivot column referencing the declaring model
    pub fn pivot_foreign_key(mut self, column: &str) -> Self {
        self.pivot_foreign_key = Some(column.to_string());
        self
    }

    /// Pivot column referencing the related model
    pub fn pivot_related_foreign_key(mut self, column: &str) -> Self {
        self.pivot_related_foreign_key = Some(column.to_string());
        self
    }
}

/// Options for `hasManyThrough`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasManyThroughOptions {
    pub related_model: String,
    pub through_model: String,
    /// Key on the declaring model
    pub local_key: Option<String>,
    /// Key on the through model referencing the declaring model
    pub foreign_key: Option<String>,
    /// The through model's own key
    pub through_local_key: Option<String>,
    /// Key on the related model referencing the through model
    pub through_foreign_key: Option<String>,
}

impl HasManyThroughOptions {
    pub fn new(related_model: &str, through_model: &str) -> Self {
        Self {
            related_model: related_model.to_string(),
            through_model: through_model.to_string(),
            local_key: None,
            foreign_key: None,
            through_local_key: None,
            through_foreign_key: None,
        }
    }

    pub fn local_key(mut self, key: &str) -> Self {
        self.local_key = Some(key.to_string());
        self
    }

    pub fn foreign_key(mut self, key: &str) -> Self {
        self.foreign_key = Some(key.to_string());
        self
    }

    pub fn through_local_key(mut self, key: &str) -> Self {
        self.through_local_key = Some(key.to_string());
        self
    }

    pub fn through_foreign_key(mut self, key: &str) -> Self {
        self.through_foreign_key = Some(key.to_string());
        self
    }
}
