//! Relation preloading
//!
//! `tree` merges dotted paths into one tree; `preloader` runs that tree
//! depth by depth over a batch of parents.

pub mod preloader;
pub mod tree;

pub use preloader::{PreloadStats, Preloader};
pub use tree::{PreloadNode, PreloadTree};
