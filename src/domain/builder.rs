//! Tree builder: nests a flat sequence of bookmarks by inferred level.

use tracing::{debug, trace};

use crate::domain::entities::{Entry, Node};
use crate::domain::level::LevelClassifier;

/// Outcome of a build: how many entries were consumed and the nodes at the requested level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Built {
    pub consumed: usize,
    pub nodes: Vec<Node>,
}

/// Constructs a bookmark forest from flat entries.
///
/// Grouping rule, applied recursively per block of siblings:
/// - an entry at the block level becomes the next sibling
/// - a deeper entry opens a sub-block under the previous sibling; the sub-block
///   runs until an entry at or above the block level shows up
/// - an entry shallower than the level the block was opened for ends the block
///
/// Malformed level sequences are accepted. A block always starts with its first
/// entry, whatever that entry's level, so a skipped level (1 followed by 3) nests
/// the deeper entry directly under the shallower one, and an outline whose first
/// entry is deeper than the start level treats that entry as a root. A later
/// entry that is shallower than the block but still inside the requested level
/// joins the block as a sibling.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder<C> {
    classifier: C,
}

impl<C: LevelClassifier> TreeBuilder<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// Build the forest of root nodes (level 1).
    pub fn build(&self, entries: &[Entry]) -> Built {
        self.build_from(entries, 1)
    }

    /// Build nodes for `start_level` and below, stopping at the first shallower entry.
    pub fn build_from(&self, entries: &[Entry], start_level: usize) -> Built {
        let (consumed, nodes) = self.build_block(entries, start_level.max(1));
        debug!(
            "build: consumed {} of {} entries into {} top-level nodes",
            consumed,
            entries.len(),
            nodes.len()
        );
        Built { consumed, nodes }
    }

    fn build_block(&self, entries: &[Entry], target: usize) -> (usize, Vec<Node>) {
        let mut nodes: Vec<Node> = Vec::new();
        let mut block_level = target;
        let mut cursor = 0;

        while let Some(entry) = entries.get(cursor) {
            let level = self.classifier.level_of(&entry.token);
            if level < target {
                break;
            }

            if level > block_level {
                if let Some(parent) = nodes.last_mut() {
                    trace!("descend below {:?} at level {}", parent.title, level);
                    let (consumed, children) =
                        self.build_block(&entries[cursor..], block_level + 1);
                    parent.children.extend(children);
                    cursor += consumed;
                    continue;
                }
            }

            block_level = level;
            nodes.push(Node::leaf(entry.title.clone(), entry.page_number));
            cursor += 1;
        }

        (cursor, nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::level::{DotCount, TabCount};

    fn titles(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn given_no_entries_when_building_then_returns_empty_forest() {
        let built = TreeBuilder::new(DotCount).build(&[]);
        assert_eq!(built.consumed, 0);
        assert!(built.nodes.is_empty());
    }

    #[test]
    fn given_single_root_entry_when_building_then_returns_single_leaf() {
        let built = TreeBuilder::new(DotCount).build(&[Entry::from_title("Preface", 3)]);
        assert_eq!(built.consumed, 1);
        assert_eq!(built.nodes, vec![Node::leaf("Preface", 3)]);
    }

    #[test]
    fn given_chapters_with_sections_when_building_then_nests_sections() {
        let entries = vec![
            Entry::from_title("Chapter 1", 5),
            Entry::from_title("1.1 Intro", 6),
            Entry::from_title("1.2 Setup", 9),
            Entry::from_title("Chapter 2", 15),
        ];

        let built = TreeBuilder::new(DotCount).build(&entries);

        assert_eq!(built.consumed, 4);
        assert_eq!(
            built.nodes,
            vec![
                Node::leaf("Chapter 1", 5).with_children(vec![
                    Node::leaf("1.1 Intro", 6),
                    Node::leaf("1.2 Setup", 9),
                ]),
                Node::leaf("Chapter 2", 15),
            ]
        );
    }

    #[test]
    fn given_start_level_when_building_subblock_then_stops_at_shallower_entry() {
        let entries = vec![
            Entry::from_title("1.1 Intro", 6),
            Entry::from_title("1.1.1 Goals", 7),
            Entry::from_title("1.2 Setup", 9),
            Entry::from_title("Chapter 2", 15),
            Entry::from_title("2.1 More", 16),
        ];

        let built = TreeBuilder::new(DotCount).build_from(&entries, 2);

        assert_eq!(built.consumed, 3);
        assert_eq!(titles(&built.nodes), vec!["1.1 Intro", "1.2 Setup"]);
        assert_eq!(titles(&built.nodes[0].children), vec!["1.1.1 Goals"]);
    }

    #[test]
    fn given_skipped_level_when_building_then_nests_directly_without_placeholder() {
        let entries = vec![
            Entry::from_title("Chapter 1", 1),
            Entry::from_title("1.1.1 Deep", 2),
            Entry::from_title("1.1.2 Deeper sibling", 3),
            Entry::from_title("1.2 Back up", 4),
            Entry::from_title("Chapter 2", 5),
        ];

        let built = TreeBuilder::new(DotCount).build(&entries);

        assert_eq!(built.consumed, 5);
        assert_eq!(titles(&built.nodes), vec!["Chapter 1", "Chapter 2"]);
        assert_eq!(
            titles(&built.nodes[0].children),
            vec!["1.1.1 Deep", "1.1.2 Deeper sibling", "1.2 Back up"]
        );
        assert!(built.nodes[0].children.iter().all(Node::is_leaf));
    }

    #[test]
    fn given_jump_of_three_levels_when_building_then_no_intermediate_nodes_appear() {
        let entries = vec![
            Entry::from_title("1 Chapter", 1),
            Entry::from_title("1.1.1.1 Very deep", 2),
            Entry::from_title("1.1.1.2 Very deep sibling", 3),
            Entry::from_title("1.2 Section", 4),
            Entry::from_title("2 Chapter", 5),
        ];

        let built = TreeBuilder::new(DotCount).build(&entries);

        assert_eq!(built.consumed, 5);
        assert_eq!(
            built.nodes,
            vec![
                Node::leaf("1 Chapter", 1).with_children(vec![
                    Node::leaf("1.1.1.1 Very deep", 2),
                    Node::leaf("1.1.1.2 Very deep sibling", 3),
                    Node::leaf("1.2 Section", 4),
                ]),
                Node::leaf("2 Chapter", 5),
            ]
        );
        assert_eq!(built.nodes[0].depth(), 2);
    }

    #[test]
    fn given_first_entry_deeper_than_start_when_building_then_treats_it_as_root() {
        let entries = vec![
            Entry::from_title("1.1 Orphan", 2),
            Entry::from_title("1.2 Orphan sibling", 3),
            Entry::from_title("2 Chapter", 4),
            Entry::from_title("2.1 Section", 5),
        ];

        let built = TreeBuilder::new(DotCount).build(&entries);

        assert_eq!(built.consumed, 4);
        assert_eq!(
            titles(&built.nodes),
            vec!["1.1 Orphan", "1.2 Orphan sibling", "2 Chapter"]
        );
        assert_eq!(titles(&built.nodes[2].children), vec!["2.1 Section"]);
    }

    #[test]
    fn given_tab_tokens_when_building_then_uses_tab_depth() {
        let entries = vec![
            Entry::new("Root", 1, "#1    Root"),
            Entry::new("Child", 2, "#2    \tChild"),
            Entry::new("Grandchild", 3, "#3    \t\tGrandchild"),
            Entry::new("Second root", 4, "#4    Second root"),
        ];

        let built = TreeBuilder::new(TabCount).build(&entries);

        assert_eq!(built.nodes.len(), 2);
        assert_eq!(built.nodes[0].depth(), 3);
        assert_eq!(built.nodes[0].children[0].children[0].title, "Grandchild");
    }
}
