//! Domain entities: core data structures

/// Flat bookmark as read from a document or a text file, before nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    /// 1-based page number
    pub page_number: u32,
    /// Raw depth hint handed to a [`LevelClassifier`](crate::domain::LevelClassifier):
    /// the title for dot counting, the whole line for tab counting.
    pub token: String,
}

impl Entry {
    pub fn new(title: impl Into<String>, page_number: u32, token: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            page_number,
            token: token.into(),
        }
    }

    /// Entry whose depth hint is its own title.
    pub fn from_title(title: impl Into<String>, page_number: u32) -> Self {
        let title = title.into();
        Self {
            token: title.clone(),
            title,
            page_number,
        }
    }
}

/// Element of the bookmark tree.
///
/// `children` keep document order; an empty vector is the only leaf representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub title: String,
    /// 1-based page number
    pub page_number: u32,
    pub children: Vec<Node>,
}

impl Node {
    pub fn leaf(title: impl Into<String>, page_number: u32) -> Self {
        Self {
            title: title.into(),
            page_number,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// Height of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }
}

/// Ordered sequence of root nodes.
pub type Forest = Vec<Node>;

/// Total number of nodes in a forest.
pub fn forest_size(forest: &[Node]) -> usize {
    forest.iter().map(Node::count).sum()
}

/// Where a bookmark points to, as found in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageLocator {
    /// 1-based page number, stored directly (text encoding)
    Page(u32),
    /// Object number inside the source document's object graph
    Reference(u32),
}

/// Page as listed by a document adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    /// 1-based page number
    pub number: u32,
    /// Object number of the page's content stream, if it has one
    pub content_id: Option<u32>,
}

/// Bookmark as read from a document, nesting already flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    pub title: String,
    /// None when the item has no destination the adapter understands
    pub locator: Option<PageLocator>,
}

impl OutlineItem {
    pub fn new(title: impl Into<String>, locator: Option<PageLocator>) -> Self {
        Self {
            title: title.into(),
            locator,
        }
    }
}
