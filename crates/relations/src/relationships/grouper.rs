//! Row Grouper - groups a flat result set by key value

use std::collections::HashMap;

use crate::value::KeyValue;

/// Rows grouped by key, each group in input order
#[derive(Debug, Clone)]
pub struct GroupedResult<T> {
    groups: HashMap<KeyValue, Vec<T>>,
}

impl<T> GroupedResult<T> {
    /// Group rows in a single pass. Rows whose key is `None` are dropped.
    pub fn group_by<I, F>(rows: I, mut key: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> Option<KeyValue>,
    {
        let mut groups: HashMap<KeyValue, Vec<T>> = HashMap::new();
        for row in rows {
            if let Some(k) = key(&row) {
                groups.entry(k).or_default().push(row);
            }
        }
        Self { groups }
    }

    /// Like [`GroupedResult::group_by`] with a fallible key extractor
    pub fn try_group_by<I, F, E>(rows: I, mut key: F) -> Result<Self, E>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> Result<Option<KeyValue>, E>,
    {
        let mut groups: HashMap<KeyValue, Vec<T>> = HashMap::new();
        for row in rows {
            if let Some(k) = key(&row)? {
                groups.entry(k).or_default().push(row);
            }
        }
        Ok(Self { groups })
    }

    pub fn get(&self, key: &KeyValue) -> Option<&[T]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Remove and return a group, empty if the key has no rows
    pub fn take(&mut self, key: &KeyValue) -> Vec<T> {
        self.groups.remove(key).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &KeyValue> {
        self.groups.keys()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
