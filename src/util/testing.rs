use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::sync::Once;

use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::infrastructure::pdf::{decode_text, encode_text};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Create a filter for noisy modules
    let noisy_modules = ["lopdf"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::ENTER)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// In-memory PDF with `page_count` pages and a flat outline.
///
/// Every page object is allocated right before its content stream, the way
/// common producers lay documents out. `bookmarks` are `(title, 1-based page)`.
pub fn sample_document(page_count: u32, bookmarks: &[(&str, u32)]) -> lopdf::Document {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for number in 1..=page_count {
        let page_id = doc.new_object_id();
        let content = format!("BT /F1 12 Tf 72 720 Td (page {number}) Tj ET");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids.clone(),
            "Count" => page_count as i64,
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };

    if !bookmarks.is_empty() {
        let outlines_id = doc.new_object_id();
        let ids: Vec<ObjectId> = bookmarks.iter().map(|_| doc.new_object_id()).collect();
        for (i, (title, page)) in bookmarks.iter().enumerate() {
            let target = kids[(*page as usize).saturating_sub(1)].clone();
            let mut item = dictionary! {
                "Title" => encode_text(title),
                "Parent" => outlines_id,
                "Dest" => vec![target, "Fit".into()],
            };
            if i > 0 {
                item.set("Prev", Object::Reference(ids[i - 1]));
            }
            if let Some(next) = ids.get(i + 1) {
                item.set("Next", Object::Reference(*next));
            }
            doc.objects.insert(ids[i], Object::Dictionary(item));
        }
        doc.objects.insert(
            outlines_id,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => ids[0],
                "Last" => ids[ids.len() - 1],
                "Count" => ids.len() as i64,
            }),
        );
        catalog.set("Outlines", Object::Reference(outlines_id));
    }

    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// Save [`sample_document`] to `path`.
pub fn write_sample_pdf(path: &Path, page_count: u32, bookmarks: &[(&str, u32)]) {
    sample_document(page_count, bookmarks)
        .save(path)
        .expect("save sample pdf");
}

/// Outline of a document as `(title, depth)` pairs in pre-order, roots at depth 1.
pub fn outline_depths(doc: &lopdf::Document) -> Vec<(String, usize)> {
    fn walk(
        doc: &lopdf::Document,
        first: Option<ObjectId>,
        depth: usize,
        out: &mut Vec<(String, usize)>,
        seen: &mut HashSet<ObjectId>,
    ) {
        let mut current = first;
        while let Some(id) = current {
            if !seen.insert(id) {
                return;
            }
            let item = doc.get_dictionary(id).expect("outline item");
            let title = item
                .get(b"Title")
                .and_then(Object::as_str)
                .map(decode_text)
                .unwrap_or_default();
            out.push((title, depth));
            let child = item.get(b"First").and_then(Object::as_reference).ok();
            walk(doc, child, depth + 1, out, seen);
            current = item.get(b"Next").and_then(Object::as_reference).ok();
        }
    }

    let mut out = Vec::new();
    let first = doc
        .catalog()
        .ok()
        .and_then(|catalog| catalog.get(b"Outlines").and_then(Object::as_reference).ok())
        .and_then(|id| doc.get_dictionary(id).ok())
        .and_then(|outlines| outlines.get(b"First").and_then(Object::as_reference).ok());
    walk(doc, first, 1, &mut out, &mut HashSet::new());
    out
}
