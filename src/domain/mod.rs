//! Domain layer: outline entities and the level inference algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod entities;
pub mod error;
pub mod flatten;
pub mod level;
pub mod locator;

pub use builder::{Built, TreeBuilder};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use flatten::{decode, flatten, format_line, parse_line, to_text, TreeFlattener};
pub use level::{DotCount, LevelClassifier, TabCount};
pub use locator::resolve;
