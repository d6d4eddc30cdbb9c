//! Preload Tree - dotted relation paths merged into one ordered tree

use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::relationships::RelationScope;

/// A relation to preload and the relations to preload beneath it
#[derive(Clone)]
pub struct PreloadNode {
    name: String,
    scope: Option<RelationScope>,
    children: Vec<PreloadNode>,
}

impl PreloadNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scope: None,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<&RelationScope> {
        self.scope.as_ref()
    }

    pub fn children(&self) -> &[PreloadNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&PreloadNode> {
        self.children.iter().find(|c| c.name == name)
    }

    fn depth(&self) -> usize {
        1 + self.children.iter().map(PreloadNode::depth).max().unwrap_or(0)
    }

    fn child_mut_or_insert(&mut self, name: &str) -> &mut PreloadNode {
        child_mut_or_insert(&mut self.children, name)
    }
}

impl fmt::Debug for PreloadNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadNode")
            .field("name", &self.name)
            .field("scoped", &self.scope.is_some())
            .field("children", &self.children)
            .finish()
    }
}

fn child_mut_or_insert<'a>(nodes: &'a mut Vec<PreloadNode>, name: &str) -> &'a mut PreloadNode {
    match nodes.iter().position(|n| n.name == name) {
        Some(index) => &mut nodes[index],
        None => {
            nodes.push(PreloadNode::new(name));
            let last = nodes.len() - 1;
            &mut nodes[last]
        }
    }
}

/// Root-level preload nodes, ordered by first insertion
#[derive(Debug, Clone, Default)]
pub struct PreloadTree {
    roots: Vec<PreloadNode>,
}

impl PreloadTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a dotted path into relation names
    pub fn parse_path(path: &str) -> ModelResult<Vec<&str>> {
        let components: Vec<&str> = path.split('.').map(str::trim).collect();
        if components.iter().any(|c| c.is_empty()) {
            return Err(ModelError::InvalidPreloadPath(format!(
                "'{}' contains an empty relation name",
                path
            )));
        }
        Ok(components)
    }

    /// Merge a path into the tree.
    ///
    /// Existing nodes are reused, so `posts` followed by `posts.comments`
    /// leaves one `posts` node. A scope replaces any earlier scope on the
    /// path's last node.
    pub fn insert(&mut self, path: &str, scope: Option<RelationScope>) -> ModelResult<()> {
        let components = Self::parse_path(path)?;
        let (first, rest) = match components.split_first() {
            Some(split) => split,
            None => return Err(ModelError::InvalidPreloadPath(path.to_string())),
        };

        let mut node = child_mut_or_insert(&mut self.roots, first);
        for name in rest {
            node = node.child_mut_or_insert(name);
        }

        if scope.is_some() {
            node.scope = scope;
        }
        Ok(())
    }

    pub fn roots(&self) -> &[PreloadNode] {
        &self.roots
    }

    /// Node at a dotted path
    pub fn get(&self, path: &str) -> Option<&PreloadNode> {
        let mut components = path.split('.');
        let first = components.next()?;
        let mut node = self.roots.iter().find(|n| n.name == first)?;
        for name in components {
            node = node.child(name)?;
        }
        Some(node)
    }

    /// Length of the longest path
    pub fn depth(&self) -> usize {
        self.roots.iter().map(PreloadNode::depth).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
