//! Model Schema - declared columns and relations of a model

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::naming::{CamelCaseNamingStrategy, NamingStrategy};
use crate::relationships::{
    BelongsTo, BelongsToOptions, HasMany, HasManyOptions, HasManyThrough, HasManyThroughOptions,
    HasOne, HasOneOptions, ManyToMany, ManyToManyOptions, Relation,
};
use crate::security::validate_identifier;

/// A declared attribute and its storage column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub attribute: String,
    pub column: String,
}

#[derive(Debug)]
pub struct ModelSchema {
    name: String,
    table: String,
    primary_key: String,
    columns: Vec<ColumnDefinition>,
    relations: Vec<Relation>,
    naming: Arc<dyn NamingStrategy>,
}

impl ModelSchema {
    pub fn builder(name: &str) -> ModelSchemaBuilder {
        ModelSchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary key attribute name
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn naming(&self) -> &dyn NamingStrategy {
        self.naming.as_ref()
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.columns.iter().any(|c| c.attribute == attribute)
    }

    /// Storage column of a declared attribute
    pub fn column_for(&self, attribute: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.attribute == attribute)
            .map(|c| c.column.as_str())
    }

    /// Attribute backed by a storage column
    pub fn attribute_for(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.attribute.as_str())
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name() == name)
    }

    /// Look up a relation, failing with `UnknownRelation`
    pub fn require_relation(&self, name: &str) -> ModelResult<&Relation> {
        self.relation(name).ok_or_else(|| ModelError::UnknownRelation {
            model: self.name.clone(),
            relation: name.to_string(),
        })
    }
}

/// Builder for [`ModelSchema`]
pub struct ModelSchemaBuilder {
    name: String,
    table: Option<String>,
    primary_key: String,
    columns: Vec<(String, Option<String>)>,
    relations: Vec<Relation>,
    naming: Arc<dyn NamingStrategy>,
}

impl ModelSchemaBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            table: None,
            primary_key: "id".to_string(),
            columns: Vec::new(),
            relations: Vec::new(),
            naming: Arc::new(CamelCaseNamingStrategy),
        }
    }

    /// Override the table name derived from the model name
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn primary_key(mut self, attribute: &str) -> Self {
        self.primary_key = attribute.to_string();
        self
    }

    pub fn naming(mut self, naming: Arc<dyn NamingStrategy>) -> Self {
        self.naming = naming;
        self
    }

    /// Declare an attribute stored under its conventional column name
    pub fn column(mut self, attribute: &str) -> Self {
        self.columns.push((attribute.to_string(), None));
        self
    }

    /// Declare an attribute stored under an explicit column name
    pub fn column_as(mut self, attribute: &str, column: &str) -> Self {
        self.columns.push((attribute.to_string(), Some(column.to_string())));
        self
    }

    pub fn columns<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for attribute in attributes {
            self.columns.push((attribute.as_ref().to_string(), None));
        }
        self
    }

    pub fn has_one(mut self, name: &str, options: HasOneOptions) -> Self {
        self.relations.push(HasOne::new(name, options).into());
        self
    }

    pub fn has_many(mut self, name: &str, options: HasManyOptions) -> Self {
        self.relations.push(HasMany::new(name, options).into());
        self
    }

    pub fn belongs_to(mut self, name: &str, options: BelongsToOptions) -> Self {
        self.relations.push(BelongsTo::new(name, options).into());
        self
    }

    pub fn many_to_many(mut self, name: &str, options: ManyToManyOptions) -> Self {
        self.relations.push(ManyToMany::new(name, options).into());
        self
    }

    pub fn has_many_through(mut self, name: &str, options: HasManyThroughOptions) -> Self {
        self.relations.push(HasManyThrough::new(name, options).into());
        self
    }

    /// Validate identifiers and build the schema
    pub fn build(self) -> ModelResult<ModelSchema> {
        let table = self
            .table
            .unwrap_or_else(|| self.naming.table_name(&self.name));
        validate_identifier(&table)?;

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());
        for (attribute, column) in self.columns {
            if !seen.insert(attribute.clone()) {
                return Err(ModelError::Schema(format!(
                    "Attribute '{}' is declared twice on model '{}'",
                    attribute, self.name
                )));
            }
            let column = column.unwrap_or_else(|| self.naming.column_name(&attribute));
            validate_identifier(&column)?;
            columns.push(ColumnDefinition { attribute, column });
        }

        let mut relation_names = HashSet::new();
        for relation in &self.relations {
            if !relation_names.insert(relation.name().to_string()) {
                return Err(ModelError::Schema(format!(
                    "Relation '{}' is declared twice on model '{}'",
                    relation.name(),
                    self.name
                )));
            }
        }

        Ok(ModelSchema {
            name: self.name,
            table,
            primary_key: self.primary_key,
            columns,
            relations: self.relations,
            naming: self.naming,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_conventional_table_and_columns() {
        let schema = ModelSchema::builder("BlogPost")
            .columns(["id", "authorId"])
            .column_as("title", "headline")
            .build()
            .unwrap();

        assert_eq!(schema.table(), "blog_posts");
        assert_eq!(schema.primary_key(), "id");
        assert_eq!(schema.column_for("authorId"), Some("author_id"));
        assert_eq!(schema.column_for("title"), Some("headline"));
        assert_eq!(schema.attribute_for("headline"), Some("title"));
        assert!(!schema.has_attribute("body"));
    }

    #[test]
    fn test_duplicate_attribute_is_rejected() {
        let result = ModelSchema::builder("User").columns(["id", "id"]).build();
        assert!(matches!(result, Err(ModelError::Schema(_))));
    }

    #[test]
    fn test_invalid_table_is_rejected() {
        let result = ModelSchema::builder("User").table("users; --").build();
        assert!(matches!(result, Err(ModelError::Schema(_))));
    }

    #[test]
    fn test_relation_lookup() {
        let schema = ModelSchema::builder("User")
            .column("id")
            .has_many("posts", HasManyOptions::new("Post"))
            .build()
            .unwrap();

        assert!(schema.relation("posts").is_some());
        assert_eq!(
            schema.require_relation("comments").unwrap_err(),
            ModelError::UnknownRelation {
                model: "User".to_string(),
                relation: "comments".to_string(),
            }
        );
    }
}
