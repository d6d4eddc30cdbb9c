//! Ambient query options carried by every query and hydrated instance

use serde::{Deserialize, Serialize};

/// Options a root query passes down to every query it causes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Named connection; `None` selects the configured default
    pub connection: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options pinned to a named connection
    pub fn on_connection(name: &str) -> Self {
        Self {
            connection: Some(name.to_string()),
        }
    }
}
