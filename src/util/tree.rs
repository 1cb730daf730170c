use std::borrow::Cow;
use std::io;

use ptree::{Style, TreeItem};

/// A labelled tree used for dumping syntax trees with [ptree]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self::new(label, Vec::new())
    }

    pub fn new(label: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    /// Render the tree into a string
    pub fn render(&self) -> io::Result<String> {
        let mut out = Vec::new();
        ptree::write_tree(self, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

impl TreeItem for TreeNode {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        write!(f, "{}", style.paint(&self.label))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(&self.children[..])
    }
}
