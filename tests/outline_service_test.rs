//! Tests for OutlineService

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use pdfmarks::application::services::{OutlineOptions, OutlineService};
use pdfmarks::application::ApplicationError;
use pdfmarks::config::Settings;
use pdfmarks::domain::{Node, OutlineItem, PageHandle, PageLocator};
use pdfmarks::infrastructure::pdf::LopdfLoader;
use pdfmarks::infrastructure::traits::{Document, DocumentLoader, RealFileSystem};
use pdfmarks::util::testing::{init_test_setup, outline_depths, write_sample_pdf};

/// Document with fixed pages and outline that records what gets written.
struct MockDocument {
    pages: Vec<PageHandle>,
    outline: Vec<OutlineItem>,
    written: Arc<Mutex<Vec<Node>>>,
}

impl Document for MockDocument {
    fn list_pages(&self) -> Vec<PageHandle> {
        self.pages.clone()
    }

    fn read_outline(&self) -> Vec<OutlineItem> {
        self.outline.clone()
    }

    fn write_outline(&self, forest: &[Node], output: &Path) -> io::Result<()> {
        *self.written.lock().unwrap() = forest.to_vec();
        std::fs::write(output, "written")
    }
}

struct MockLoader {
    outline: Vec<OutlineItem>,
    written: Arc<Mutex<Vec<Node>>>,
}

impl MockLoader {
    fn new(outline: Vec<OutlineItem>) -> Self {
        Self {
            outline,
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DocumentLoader for MockLoader {
    fn load(&self, _path: &Path) -> io::Result<Box<dyn Document>> {
        // content streams 10, 20, 30
        let pages = (1..=3)
            .map(|number| PageHandle {
                number,
                content_id: Some(number * 10),
            })
            .collect();
        Ok(Box::new(MockDocument {
            pages,
            outline: self.outline.clone(),
            written: Arc::clone(&self.written),
        }))
    }
}

fn touch(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, "%PDF-mock").expect("write file");
    path
}

fn mock_service(outline: Vec<OutlineItem>) -> (OutlineService, Arc<Mutex<Vec<Node>>>) {
    let loader = MockLoader::new(outline);
    let written = Arc::clone(&loader.written);
    let service = OutlineService::new(Arc::new(RealFileSystem), Arc::new(loader));
    (service, written)
}

fn titles(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(|n| n.title.as_str()).collect()
}

#[test]
fn given_reference_locators_when_inferring_then_pages_resolve_by_content_id() {
    // Arrange
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let input = touch(&temp, "book.pdf");
    let (service, _) = mock_service(vec![
        OutlineItem::new("  Chapter 1 ", Some(PageLocator::Reference(5))),
        OutlineItem::new("1.1 Intro", Some(PageLocator::Reference(15))),
        OutlineItem::new("Appendix", Some(PageLocator::Page(3))),
    ]);

    // Act
    let forest = service.infer(&input, &OutlineOptions::default()).unwrap();

    // Assert
    assert_eq!(
        forest,
        vec![
            Node::leaf("Chapter 1", 1).with_children(vec![Node::leaf("1.1 Intro", 2)]),
            Node::leaf("Appendix", 3),
        ]
    );
}

#[test]
fn given_unresolvable_locators_when_inferring_then_falls_back_to_configured_page() {
    let temp = TempDir::new().unwrap();
    let input = touch(&temp, "book.pdf");
    let (service, _) = mock_service(vec![
        OutlineItem::new("Beyond", Some(PageLocator::Reference(99))),
        OutlineItem::new("Nowhere", None),
    ]);
    let opts = OutlineOptions {
        unresolved_page: 2,
        ..OutlineOptions::default()
    };

    let forest = service.infer(&input, &opts).unwrap();

    assert!(forest.iter().all(|n| n.page_number == 2));
    assert_eq!(titles(&forest), vec!["Beyond", "Nowhere"]);
}

#[test]
fn given_strip_disabled_when_inferring_then_titles_keep_whitespace() {
    let temp = TempDir::new().unwrap();
    let input = touch(&temp, "book.pdf");
    let (service, _) = mock_service(vec![OutlineItem::new(
        " Padded ",
        Some(PageLocator::Page(1)),
    )]);
    let opts = OutlineOptions {
        strip_titles: false,
        ..OutlineOptions::default()
    };

    let forest = service.infer(&input, &opts).unwrap();

    assert_eq!(forest[0].title, " Padded ");
}

#[test]
fn given_missing_input_when_rebuilding_then_file_not_found() {
    let temp = TempDir::new().unwrap();
    let (service, _) = mock_service(Vec::new());

    let result = service.rebuild(
        &temp.path().join("absent.pdf"),
        &temp.path().join("out.pdf"),
        &OutlineOptions::default(),
    );

    assert!(matches!(result, Err(ApplicationError::FileNotFound(_))));
}

#[test]
fn given_text_file_when_importing_then_document_receives_parsed_forest() {
    let temp = TempDir::new().unwrap();
    let input = touch(&temp, "book.pdf");
    let bookmarks = temp.path().join("book.txt");
    std::fs::write(&bookmarks, "#1    Part I\n#2    \tChapter 1\n#7    Part II\n").unwrap();
    let output = temp.path().join("book-bookmarked.pdf");
    let (service, written) = mock_service(Vec::new());

    let report = service.import(&input, &bookmarks, &output).unwrap();

    assert_eq!(report.bookmarks, 3);
    assert_eq!(report.roots, 2);
    assert!(output.exists());
    assert_eq!(
        *written.lock().unwrap(),
        vec![
            Node::leaf("Part I", 1).with_children(vec![Node::leaf("Chapter 1", 2)]),
            Node::leaf("Part II", 7),
        ]
    );
}

#[test]
fn given_malformed_text_file_when_importing_then_domain_error_and_no_output() {
    let temp = TempDir::new().unwrap();
    let input = touch(&temp, "book.pdf");
    let bookmarks = temp.path().join("book.txt");
    std::fs::write(&bookmarks, "#1    Part I\nPart II without page\n").unwrap();
    let output = temp.path().join("out.pdf");
    let (service, _) = mock_service(Vec::new());

    let result = service.import(&input, &bookmarks, &output);

    assert!(matches!(result, Err(ApplicationError::Domain(_))));
    assert!(!output.exists());
}

#[test]
fn given_document_when_exporting_then_text_file_is_written() {
    let temp = TempDir::new().unwrap();
    let input = touch(&temp, "book.pdf");
    let output = temp.path().join("book.txt");
    let (service, _) = mock_service(vec![
        OutlineItem::new("Chapter 1", Some(PageLocator::Page(1))),
        OutlineItem::new("1.1 Intro", Some(PageLocator::Page(2))),
    ]);

    let count = service
        .export(&input, &output, &OutlineOptions::default())
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "#1    Chapter 1\n#2    \t1.1 Intro\n"
    );
}

#[test]
fn given_untitled_and_padded_bookmarks_when_exporting_and_importing_then_titles_survive() {
    let temp = TempDir::new().unwrap();
    let input = touch(&temp, "book.pdf");
    let text = temp.path().join("book.txt");
    let output = temp.path().join("book-bookmarked.pdf");
    let (service, written) = mock_service(vec![
        OutlineItem::new("", Some(PageLocator::Page(1))),
        OutlineItem::new("  Lead", Some(PageLocator::Page(2))),
        OutlineItem::new("Trail  ", Some(PageLocator::Page(3))),
    ]);
    let opts = OutlineOptions {
        strip_titles: false,
        ..OutlineOptions::default()
    };

    service.export(&input, &text, &opts).unwrap();
    service.import(&input, &text, &output).unwrap();

    assert_eq!(
        *written.lock().unwrap(),
        vec![
            Node::leaf("", 1),
            Node::leaf("  Lead", 2),
            Node::leaf("Trail  ", 3),
        ]
    );
}

#[test]
fn given_directory_when_finding_documents_then_skips_outputs_and_other_files() {
    let temp = TempDir::new().unwrap();
    touch(&temp, "b.pdf");
    touch(&temp, "a.PDF");
    touch(&temp, "a-bookmarked.pdf");
    touch(&temp, "notes.txt");
    let (service, _) = mock_service(Vec::new());

    let found = service
        .find_documents(temp.path(), &Settings::default())
        .unwrap();

    let names: Vec<String> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.PDF", "b.pdf"]);
}

#[test]
fn given_file_instead_of_directory_when_batching_then_not_a_directory() {
    let temp = TempDir::new().unwrap();
    let file = touch(&temp, "book.pdf");
    let (service, _) = mock_service(Vec::new());

    let result = service.batch(&file, &Settings::default());

    assert!(matches!(result, Err(ApplicationError::NotADirectory(_))));
}

// ============================================================
// lopdf backed
// ============================================================

fn lopdf_service() -> OutlineService {
    OutlineService::new(Arc::new(RealFileSystem), Arc::new(LopdfLoader))
}

#[test]
fn given_flat_pdf_outline_when_rebuilding_then_output_is_nested() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("book.pdf");
    write_sample_pdf(
        &input,
        16,
        &[
            ("Chapter 1", 5),
            ("1.1 Intro", 6),
            ("1.2 Setup", 9),
            ("Chapter 2", 15),
        ],
    );
    let output = temp.path().join("book-bookmarked.pdf");

    let report = lopdf_service()
        .rebuild(&input, &output, &OutlineOptions::default())
        .unwrap();

    assert_eq!(report.bookmarks, 4);
    assert_eq!(report.roots, 2);
    let written = lopdf::Document::load(&output).unwrap();
    assert_eq!(
        outline_depths(&written),
        vec![
            ("Chapter 1".to_string(), 1),
            ("1.1 Intro".to_string(), 2),
            ("1.2 Setup".to_string(), 2),
            ("Chapter 2".to_string(), 1),
        ]
    );
    // input untouched
    assert_eq!(
        outline_depths(&lopdf::Document::load(&input).unwrap())
            .iter()
            .map(|(_, depth)| *depth)
            .collect::<Vec<_>>(),
        vec![1, 1, 1, 1]
    );
}

#[test]
fn given_rebuilt_pdf_when_exporting_then_pages_match_original_bookmarks() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("book.pdf");
    write_sample_pdf(&input, 10, &[("1 Start", 1), ("1.1 Detail", 4), ("2 End", 10)]);
    let service = lopdf_service();

    let text = service
        .export_text(&input, &OutlineOptions::default())
        .unwrap();

    assert_eq!(text, "#1    1 Start\n#4    \t1.1 Detail\n#10   2 End\n");
}

#[test]
fn given_exported_text_when_importing_then_outline_matches_edit() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("book.pdf");
    write_sample_pdf(&input, 5, &[("Intro", 1), ("Body", 3)]);
    let bookmarks = temp.path().join("book.txt");
    std::fs::write(&bookmarks, "#1    Intro\n#3    Body\n#4    \tDetails\n").unwrap();
    let output = temp.path().join("book-edited.pdf");

    let report = lopdf_service().import(&input, &bookmarks, &output).unwrap();

    assert_eq!(report.bookmarks, 3);
    let text = lopdf_service()
        .export_text(&output, &OutlineOptions::default())
        .unwrap();
    // Details has no section number, so inference keeps it at the root
    assert_eq!(text, "#1    Intro\n#3    Body\n#4    Details\n");
    assert_eq!(
        outline_depths(&lopdf::Document::load(&output).unwrap())[2],
        ("Details".to_string(), 2)
    );
}

#[test]
fn given_directory_with_corrupt_file_when_batching_then_others_still_processed() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    write_sample_pdf(&temp.path().join("a.pdf"), 3, &[("1 A", 1), ("1.1 B", 2)]);
    std::fs::write(temp.path().join("broken.pdf"), "not a pdf at all").unwrap();
    write_sample_pdf(&temp.path().join("c.pdf"), 2, &[("Only", 2)]);

    let report = lopdf_service()
        .batch(temp.path(), &Settings::default())
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].input.ends_with("broken.pdf"));
    assert!(temp.path().join("a-bookmarked.pdf").exists());
    assert!(temp.path().join("c-bookmarked.pdf").exists());
    assert!(!temp.path().join("broken-bookmarked.pdf").exists());
}

#[test]
fn given_previous_batch_outputs_when_batching_again_then_outputs_are_not_reprocessed() {
    let temp = TempDir::new().unwrap();
    write_sample_pdf(&temp.path().join("a.pdf"), 1, &[("A", 1)]);
    let service = lopdf_service();

    service.batch(temp.path(), &Settings::default()).unwrap();
    let second = service.batch(temp.path(), &Settings::default()).unwrap();

    assert_eq!(second.processed.len(), 1);
    assert!(!temp.path().join("a-bookmarked-bookmarked.pdf").exists());
}
