//! Depth inference from the lexical shape of a single token.

use crate::domain::flatten::page_field;

/// Number of characters in front of the indentation of a text bookmark line:
/// marker, 4 columns of page number, one space.
pub const PAGE_FIELD_WIDTH: usize = 6;

/// Derives a 1-based depth from one token.
///
/// Implementations are pure: they never look at siblings or ancestors.
pub trait LevelClassifier {
    fn level_of(&self, token: &str) -> usize;
}

impl<C: LevelClassifier + ?Sized> LevelClassifier for &C {
    fn level_of(&self, token: &str) -> usize {
        (**self).level_of(token)
    }
}

/// Counts the dots of the section number in front of a title.
///
/// `"1.2.3 Scope"` is level 3, `"Chapter 1"` is level 1. Only the first
/// whitespace-delimited word is inspected, so dots later in the title don't count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DotCount;

impl LevelClassifier for DotCount {
    fn level_of(&self, token: &str) -> usize {
        let head = token
            .trim_start()
            .split(char::is_whitespace)
            .next()
            .unwrap_or_default();
        head.matches('.').count() + 1
    }
}

/// Counts the tabs behind the page field of a text bookmark line.
///
/// The field is 6 columns unless a page number above 9999 widens it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabCount;

impl LevelClassifier for TabCount {
    fn level_of(&self, token: &str) -> usize {
        let tabs = match page_field(token) {
            Some((_, start)) => token[start..].chars().take_while(|c| *c == '\t').count(),
            None => token
                .chars()
                .skip(PAGE_FIELD_WIDTH)
                .take_while(|c| *c == '\t')
                .count(),
        };
        tabs + 1
    }
}
