//! Utilities
//!
//! Small types used throughout the crate.

mod node_id;
mod span;
mod tree;

pub use node_id::{NodeId, NodeIdCounter};
pub use span::Span;
pub use tree::TreeNode;
