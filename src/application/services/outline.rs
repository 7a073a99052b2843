//! Outline service
//!
//! Turns the flat bookmark list of a document into a nested outline, and moves
//! outlines between documents and the text encoding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    decode, forest_size, resolve, to_text, DotCount, Entry, Node, TabCount, TreeBuilder,
};
use crate::infrastructure::traits::{Document, DocumentLoader, FileSystem};
use crate::util::path::{has_extension, has_stem_suffix, with_stem_suffix};

/// Per-call knobs for reading bookmarks out of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineOptions {
    /// Trim surrounding whitespace from titles
    pub strip_titles: bool,
    /// Page used when a destination cannot be resolved
    pub unresolved_page: u32,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            strip_titles: true,
            unresolved_page: 1,
        }
    }
}

impl From<&Settings> for OutlineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            strip_titles: settings.strip_titles,
            unresolved_page: settings.unresolved_page,
        }
    }
}

/// Result of writing one output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Total number of bookmarks written
    pub bookmarks: usize,
    /// Number of top-level bookmarks
    pub roots: usize,
}

/// Document that could not be processed during a batch run.
#[derive(Debug)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: ApplicationError,
}

/// Outcome of a batch run, one entry per document found.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<RebuildReport>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Service for inferring, exporting and applying nested outlines.
pub struct OutlineService {
    fs: Arc<dyn FileSystem>,
    loader: Arc<dyn DocumentLoader>,
}

impl OutlineService {
    /// Create a new outline service.
    pub fn new(fs: Arc<dyn FileSystem>, loader: Arc<dyn DocumentLoader>) -> Self {
        Self { fs, loader }
    }

    fn load(&self, input: &Path) -> ApplicationResult<Box<dyn Document>> {
        if !self.fs.is_file(input) {
            return Err(ApplicationError::FileNotFound(input.to_path_buf()));
        }
        self.loader
            .load(input)
            .with_path_context("load document", input)
    }

    /// Flat entries of a document with resolved page numbers.
    ///
    /// Bookmarks whose destination cannot be resolved are kept and pointed at
    /// `opts.unresolved_page`.
    pub fn entries(&self, document: &dyn Document, opts: &OutlineOptions) -> Vec<Entry> {
        let pages = document.list_pages();
        let items = document.read_outline();
        debug!(
            "entries: {} outline items over {} pages",
            items.len(),
            pages.len()
        );

        items
            .into_iter()
            .map(|item| {
                let title = if opts.strip_titles {
                    item.title.trim().to_string()
                } else {
                    item.title
                };
                let page = item
                    .locator
                    .and_then(|locator| resolve(locator, &pages))
                    .unwrap_or_else(|| {
                        warn!(
                            "cannot resolve page of {:?} ({:?}), using page {}",
                            title, item.locator, opts.unresolved_page
                        );
                        opts.unresolved_page
                    });
                Entry::from_title(title, page)
            })
            .collect()
    }

    /// Nested outline inferred from the section numbers of a document's bookmarks.
    pub fn infer(&self, input: &Path, opts: &OutlineOptions) -> ApplicationResult<Vec<Node>> {
        debug!("infer: input={}", input.display());
        let document = self.load(input)?;
        Ok(self.infer_from(document.as_ref(), opts))
    }

    fn infer_from(&self, document: &dyn Document, opts: &OutlineOptions) -> Vec<Node> {
        let entries = self.entries(document, opts);
        let built = TreeBuilder::new(DotCount).build(&entries);
        info!("bookmarks count: {}", built.consumed);
        built.nodes
    }

    /// Write a copy of `input` whose outline is nested by section numbers.
    pub fn rebuild(
        &self,
        input: &Path,
        output: &Path,
        opts: &OutlineOptions,
    ) -> ApplicationResult<RebuildReport> {
        debug!(
            "rebuild: input={}, output={}",
            input.display(),
            output.display()
        );
        let document = self.load(input)?;
        let forest = self.infer_from(document.as_ref(), opts);
        self.write(document.as_ref(), input, output, &forest)
    }

    /// Text encoding of the outline inferred for `input`.
    pub fn export_text(&self, input: &Path, opts: &OutlineOptions) -> ApplicationResult<String> {
        let forest = self.infer(input, opts)?;
        Ok(to_text(&forest))
    }

    /// Write the text encoding of `input`'s inferred outline to `output`.
    ///
    /// Returns the number of bookmarks written.
    pub fn export(
        &self,
        input: &Path,
        output: &Path,
        opts: &OutlineOptions,
    ) -> ApplicationResult<usize> {
        debug!(
            "export: input={}, output={}",
            input.display(),
            output.display()
        );
        let forest = self.infer(input, opts)?;
        self.fs
            .write_atomic(output, &to_text(&forest))
            .with_path_context("write bookmarks", output)?;
        Ok(forest_size(&forest))
    }

    /// Parse a bookmark text file into a forest.
    pub fn read_text(&self, path: &Path) -> ApplicationResult<Vec<Node>> {
        debug!("read_text: path={}", path.display());
        if !self.fs.is_file(path) {
            return Err(ApplicationError::FileNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read bookmarks", path)?;
        let entries = decode(&content)?;
        let built = TreeBuilder::new(TabCount).build(&entries);
        info!("bookmarks count: {}", built.consumed);
        Ok(built.nodes)
    }

    /// Write a copy of `input` carrying the outline described by the text file `bookmarks`.
    pub fn import(
        &self,
        input: &Path,
        bookmarks: &Path,
        output: &Path,
    ) -> ApplicationResult<RebuildReport> {
        debug!(
            "import: input={}, bookmarks={}, output={}",
            input.display(),
            bookmarks.display(),
            output.display()
        );
        let forest = self.read_text(bookmarks)?;
        let document = self.load(input)?;
        self.write(document.as_ref(), input, output, &forest)
    }

    fn write(
        &self,
        document: &dyn Document,
        input: &Path,
        output: &Path,
        forest: &[Node],
    ) -> ApplicationResult<RebuildReport> {
        document
            .write_outline(forest, output)
            .with_path_context("write document", output)?;
        Ok(RebuildReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            bookmarks: forest_size(forest),
            roots: forest.len(),
        })
    }

    /// Documents in `dir` matching the configured extension, outputs of earlier runs excluded.
    pub fn find_documents(&self, dir: &Path, settings: &Settings) -> ApplicationResult<Vec<PathBuf>> {
        debug!("find_documents: dir={}", dir.display());
        if !self.fs.is_dir(dir) {
            return Err(ApplicationError::NotADirectory(dir.to_path_buf()));
        }
        let mut files: Vec<PathBuf> = self
            .fs
            .list_files(dir, settings.recursive)
            .with_path_context("scan directory", dir)?
            .into_iter()
            .filter(|path| has_extension(path, &settings.extension))
            .filter(|path| !has_stem_suffix(path, &settings.suffix))
            .collect();
        files.sort();
        debug!("find_documents: found {} documents", files.len());
        Ok(files)
    }

    /// Rebuild every document in `dir` into a sibling `<stem><suffix>.<ext>`.
    ///
    /// A failing document is recorded and the run continues with the next one.
    pub fn batch(&self, dir: &Path, settings: &Settings) -> ApplicationResult<BatchReport> {
        let opts = OutlineOptions::from(settings);
        let mut report = BatchReport::default();

        for input in self.find_documents(dir, settings)? {
            info!("processing: {}", input.display());
            let output = with_stem_suffix(&input, &settings.suffix);
            match self.rebuild(&input, &output, &opts) {
                Ok(done) => report.processed.push(done),
                Err(error) => {
                    warn!("skipping {}: {}", input.display(), error);
                    report.failed.push(BatchFailure { input, error });
                }
            }
        }

        info!(
            "batch: {} processed, {} failed",
            report.processed.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
