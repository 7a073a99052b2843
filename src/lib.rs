//! pdfmarks: nested PDF bookmarks from section-numbered flat outlines.
//!
//! Layers, innermost first: [`domain`] (pure tree building and text encoding),
//! [`application`] (use cases), [`infrastructure`] (filesystem and PDF
//! backend), [`cli`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
