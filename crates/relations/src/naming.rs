//! Naming Strategy - conventions for table, column and key names
//!
//! Attribute names are camelCase on the application side and snake_case in
//! storage. Relation keys that are not declared explicitly are derived from
//! these conventions when the relation boots.

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use pluralizer::pluralize;

/// Conventions used to derive names that were not declared explicitly
pub trait NamingStrategy: Send + Sync + std::fmt::Debug {
    /// Table name for a model
    fn table_name(&self, model_name: &str) -> String;

    /// Storage column for an attribute
    fn column_name(&self, attribute_name: &str) -> String;

    /// Attribute name for a storage column
    fn serialize_name(&self, column_name: &str) -> String;

    /// Foreign key attribute referencing a model's primary key
    fn relation_foreign_key(&self, model_name: &str, primary_key: &str) -> String;

    /// Pivot table joining two models
    fn relation_pivot_table(&self, model_name: &str, related_model_name: &str) -> String;

    /// Pivot column referencing a model's primary key
    fn relation_pivot_foreign_key(&self, model_name: &str, primary_key: &str) -> String;
}

/// Default strategy: camelCase attributes, snake_case plural tables
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseNamingStrategy;

fn singular_snake(model_name: &str) -> String {
    pluralize(&model_name.to_snake_case(), 1, false)
}

impl NamingStrategy for CamelCaseNamingStrategy {
    fn table_name(&self, model_name: &str) -> String {
        pluralize(&model_name.to_snake_case(), 2, false)
    }

    fn column_name(&self, attribute_name: &str) -> String {
        attribute_name.to_snake_case()
    }

    fn serialize_name(&self, column_name: &str) -> String {
        column_name.to_lower_camel_case()
    }

    fn relation_foreign_key(&self, model_name: &str, primary_key: &str) -> String {
        format!(
            "{}{}",
            singular_snake(model_name).to_lower_camel_case(),
            primary_key.to_upper_camel_case()
        )
    }

    fn relation_pivot_table(&self, model_name: &str, related_model_name: &str) -> String {
        let mut names = [singular_snake(model_name), singular_snake(related_model_name)];
        names.sort();
        names.join("_")
    }

    fn relation_pivot_foreign_key(&self, model_name: &str, primary_key: &str) -> String {
        format!("{}_{}", singular_snake(model_name), primary_key.to_snake_case())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_names_are_plural_snake_case() {
        let naming = CamelCaseNamingStrategy;
        assert_eq!(naming.table_name("User"), "users");
        assert_eq!(naming.table_name("BlogPost"), "blog_posts");
    }

    #[test]
    fn test_column_and_serialize_names() {
        let naming = CamelCaseNamingStrategy;
        assert_eq!(naming.column_name("userId"), "user_id");
        assert_eq!(naming.column_name("id"), "id");
        assert_eq!(naming.serialize_name("user_id"), "userId");
    }

    #[test]
    fn test_foreign_key_is_singular_model_plus_primary_key() {
        let naming = CamelCaseNamingStrategy;
        assert_eq!(naming.relation_foreign_key("User", "id"), "userId");
        assert_eq!(naming.relation_foreign_key("BlogPost", "id"), "blogPostId");
        assert_eq!(naming.column_name(&naming.relation_foreign_key("User", "id")), "user_id");
    }

    #[test]
    fn test_pivot_names() {
        let naming = CamelCaseNamingStrategy;
        assert_eq!(naming.relation_pivot_table("User", "Skill"), "skill_user");
        assert_eq!(naming.relation_pivot_table("Skill", "User"), "skill_user");
        assert_eq!(naming.relation_pivot_foreign_key("User", "id"), "user_id");
    }
}
