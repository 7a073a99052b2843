use termtree::Tree;
use tracing::instrument;

use crate::domain::Node;

/// Render outlines as `termtree` trees for terminal display.
pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn label(node: &Node) -> String {
    format!("{} (p. {})", node.title, node.page_number)
}

impl TreeNodeConvert for Node {
    fn to_tree_string(&self) -> Tree<String> {
        let leaves: Vec<_> = self.children.iter().map(|c| c.to_tree_string()).collect();
        Tree::new(label(self)).with_leaves(leaves)
    }
}

// A forest hangs below a synthetic root carrying the document name.
impl TreeNodeConvert for (&str, &[Node]) {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let (root, nodes) = *self;
        let leaves: Vec<_> = nodes.iter().map(|n| n.to_tree_string()).collect();
        Tree::new(root.to_string()).with_leaves(leaves)
    }
}
