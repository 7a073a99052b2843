//! Text encoding of a bookmark tree.
//!
//! One bookmark per line: `#`, the page number left-justified in 4 columns, a
//! space, one tab per level below the root, the title.
//!
//! ```text
//! #5    Chapter 1
//! #6    \t1.1 Intro
//! ```
//!
//! The page field is 6 columns wide. Page numbers above 9999 widen it to the
//! number plus one space; [`page_field`] finds its end either way.

use tracing::warn;

use crate::domain::entities::{Entry, Node};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::level::PAGE_FIELD_WIDTH;

/// First character of every bookmark line.
pub const MARKER: char = '#';

/// Formats one bookmark line, terminator included.
///
/// Line breaks inside the title are replaced by spaces; they would split the record.
pub fn format_line(page_number: u32, level: usize, title: &str) -> String {
    let title: String = title
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!(
        "{MARKER}{:<4} {}{}\n",
        page_number,
        "\t".repeat(level.saturating_sub(1)),
        title
    )
}

/// Walks a forest depth-first and emits one line per node.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeFlattener;

impl TreeFlattener {
    /// Lines for `nodes` placed at `level`; children follow their parent at `level + 1`.
    pub fn flatten(&self, nodes: &[Node], level: usize) -> Vec<String> {
        let mut lines = Vec::new();
        Self::push_lines(nodes, level.max(1), &mut lines);
        lines
    }

    fn push_lines(nodes: &[Node], level: usize, lines: &mut Vec<String>) {
        for node in nodes {
            lines.push(format_line(node.page_number, level, &node.title));
            Self::push_lines(&node.children, level + 1, lines);
        }
    }
}

/// Lines of a forest whose roots are at level 1.
pub fn flatten(nodes: &[Node]) -> Vec<String> {
    TreeFlattener.flatten(nodes, 1)
}

/// Whole text file for a forest.
pub fn to_text(nodes: &[Node]) -> String {
    flatten(nodes).concat()
}

/// Locates the page field of a bookmark line: `#`, digits, one space, and
/// further spaces up to column [`PAGE_FIELD_WIDTH`].
///
/// Returns the digits and the byte offset where the indentation starts, or
/// `None` if `token` does not start with a page field.
pub fn page_field(token: &str) -> Option<(&str, usize)> {
    let rest = token.strip_prefix(MARKER)?;
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let mut end = MARKER.len_utf8() + digits;
    if !token[end..].starts_with(' ') {
        return None;
    }
    end += 1;
    while end < PAGE_FIELD_WIDTH && token[end..].starts_with(' ') {
        end += 1;
    }
    Some((&rest[..digits], end))
}

/// Parses one bookmark line into an entry whose token is the raw line.
///
/// The title is everything behind the indentation tabs, kept verbatim; it may
/// be empty. `line_no` is 1-based and only used for error messages.
pub fn parse_line(line: &str, line_no: usize) -> DomainResult<Entry> {
    let line = line.trim_end_matches(['\r', '\n']);
    let invalid = |message: &str| DomainError::InvalidLine {
        line: line_no,
        message: message.to_string(),
    };

    let (number, end) = page_field(line)
        .ok_or_else(|| invalid("expected '#' followed by a page number and a space"))?;
    let page_number: u32 = number
        .parse()
        .map_err(|_| invalid(&format!("invalid page number {:?}", number)))?;
    if page_number == 0 {
        return Err(invalid("page numbers start at 1"));
    }
    let title = line[end..].trim_start_matches('\t');

    Ok(Entry::new(title, page_number, line))
}

/// Parses a text file into flat entries.
///
/// Reading stops at the first blank line; anything after it is ignored.
pub fn decode(text: &str) -> DomainResult<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut lines = text.lines().enumerate();

    for (idx, line) in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        entries.push(parse_line(line, idx + 1)?);
    }

    let ignored = lines.filter(|(_, l)| !l.trim().is_empty()).count();
    if ignored > 0 {
        warn!(
            "decode: ignoring {} bookmark lines after blank line {}",
            ignored,
            entries.len() + 1
        );
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::TreeBuilder;
    use crate::domain::level::{LevelClassifier, TabCount};

    fn scenario_forest() -> Vec<Node> {
        vec![
            Node::leaf("Chapter 1", 5).with_children(vec![
                Node::leaf("1.1 Intro", 6),
                Node::leaf("1.2 Setup", 9),
            ]),
            Node::leaf("Chapter 2", 15),
        ]
    }

    #[test]
    fn given_forest_when_flattening_then_emits_preorder_lines() {
        let lines = flatten(&scenario_forest());
        assert_eq!(
            lines,
            vec![
                "#5    Chapter 1\n",
                "#6    \t1.1 Intro\n",
                "#9    \t1.2 Setup\n",
                "#15   Chapter 2\n",
            ]
        );
    }

    #[test]
    fn given_level_when_flattening_then_indents_from_that_level() {
        let lines = TreeFlattener.flatten(&[Node::leaf("Nested", 3)], 3);
        assert_eq!(lines, vec!["#3    \t\tNested\n"]);
    }

    #[test]
    fn given_four_digit_page_when_formatting_then_field_stays_six_wide() {
        let line = format_line(1234, 2, "Index");
        assert_eq!(line, "#1234 \tIndex\n");
        assert_eq!(TabCount.level_of(&line), 2);
    }

    #[test]
    fn given_title_with_newline_when_formatting_then_keeps_single_line() {
        assert_eq!(format_line(1, 1, "two\nlines"), "#1    two lines\n");
    }

    #[test]
    fn given_valid_line_when_parsing_then_extracts_page_and_title() {
        let entry = parse_line("#12   \t\tDeep title  \n", 1).unwrap();
        assert_eq!(entry.page_number, 12);
        assert_eq!(entry.title, "Deep title  ");
        assert_eq!(entry.token, "#12   \t\tDeep title  ");
    }

    #[test]
    fn given_line_without_marker_when_parsing_then_reports_line_number() {
        let err = parse_line("12 Title", 7).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidLine {
                line: 7,
                message: "expected '#' followed by a page number and a space".to_string()
            }
        );
    }

    #[test]
    fn given_bad_page_number_when_parsing_then_errors() {
        assert!(parse_line("#x1   Title", 1).is_err());
        assert!(parse_line("#0    Title", 1).is_err());
        assert!(parse_line("#3", 1).is_err());
        assert!(parse_line("#+3   Title", 1).is_err());
    }

    #[test]
    fn given_page_without_title_when_parsing_then_title_is_empty() {
        let entry = parse_line("#3    \n", 1).unwrap();
        assert_eq!(entry.page_number, 3);
        assert_eq!(entry.title, "");
    }

    #[test]
    fn given_single_space_after_page_when_parsing_then_accepts_hand_written_line() {
        let entry = parse_line("#5 Title", 1).unwrap();
        assert_eq!(entry.title, "Title");
        assert_eq!(TabCount.level_of("#5 \tChild"), 2);
    }

    #[test]
    fn given_blank_line_when_decoding_then_stops_reading() {
        let text = "#1    A\n#2    \tB\n\n#3    C\n";
        let entries = decode(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].title, "B");
    }

    #[test]
    fn given_flattened_forest_when_decoding_and_building_then_round_trips() {
        let forest = scenario_forest();
        let entries = decode(&to_text(&forest)).unwrap();
        let built = TreeBuilder::new(TabCount).build(&entries);
        assert_eq!(built.consumed, 4);
        assert_eq!(built.nodes, forest);
    }

    #[test]
    fn given_blank_and_padded_titles_when_round_tripping_then_titles_are_kept() {
        let forest = vec![
            Node::leaf("", 1).with_children(vec![Node::leaf("  Lead", 2)]),
            Node::leaf("Trail  ", 3).with_children(vec![Node::leaf(" ", 4)]),
        ];

        let entries = decode(&to_text(&forest)).unwrap();
        let built = TreeBuilder::new(TabCount).build(&entries);

        assert_eq!(built.nodes, forest);
    }

    #[test]
    fn given_five_digit_pages_when_round_tripping_then_nesting_survives() {
        let forest = vec![Node::leaf("Root", 10000).with_children(vec![
            Node::leaf("Child", 10001).with_children(vec![Node::leaf("  Grandchild", 123456)]),
        ])];

        let text = to_text(&forest);
        let built = TreeBuilder::new(TabCount).build(&decode(&text).unwrap());

        assert_eq!(text.lines().next(), Some("#10000 Root"));
        assert_eq!(built.nodes, forest);
    }
}
