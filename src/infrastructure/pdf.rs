//! PDF documents via `lopdf`
//!
//! Reads the outline of a document as a flat list and writes a nested outline
//! into a copy of it. Outline items point at pages with `[page /Fit]` destinations.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use lopdf::{Dictionary, Object, ObjectId, StringFormat};
use tracing::{debug, warn};

use crate::domain::{forest_size, Node, OutlineItem, PageHandle, PageLocator};
use crate::infrastructure::traits::{persist_atomic, Document, DocumentLoader};

/// Named destinations may point at further names; stop following after this many hops.
const MAX_INDIRECTION: usize = 8;

fn pdf_err(e: lopdf::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

/// Decode a PDF text string: UTF-16BE with byte order mark, UTF-8 with BOM, or
/// PDFDocEncoding (read as Latin-1, which agrees on all printable ASCII).
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(b"\xFE\xFF") {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode a title as PDF text string: literal ASCII, otherwise UTF-16BE with BOM.
pub fn encode_text(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Loads documents with `lopdf`.
#[derive(Debug, Default)]
pub struct LopdfLoader;

impl DocumentLoader for LopdfLoader {
    fn load(&self, path: &Path) -> io::Result<Box<dyn Document>> {
        let inner = lopdf::Document::load(path).map_err(pdf_err)?;
        debug!(
            "load: {} ({} objects, version {})",
            path.display(),
            inner.objects.len(),
            inner.version
        );
        Ok(Box::new(PdfDocument::new(inner)))
    }
}

/// Document adapter over an in-memory `lopdf::Document`.
///
/// Page references in bookmarks are handed out as object numbers and resolved
/// against the object numbers of the pages' content streams. That assumes the
/// producer numbered objects in page order; documents rewritten by tools that
/// renumber objects can resolve to wrong pages.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    inner: lopdf::Document,
}

impl PdfDocument {
    pub fn new(inner: lopdf::Document) -> Self {
        Self { inner }
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        let (_, object) = self.inner.dereference(object).ok()?;
        object.as_dict().ok()
    }

    fn content_id(&self, page_id: ObjectId) -> Option<u32> {
        let page = self.inner.get_dictionary(page_id).ok()?;
        match page.get(b"Contents").ok()? {
            Object::Reference(id) => Some(id.0),
            Object::Array(parts) => parts
                .iter()
                .filter_map(|part| part.as_reference().ok())
                .map(|id| id.0)
                .max(),
            _ => None,
        }
    }

    fn first_outline_item(&self) -> Option<ObjectId> {
        let catalog = self.inner.catalog().ok()?;
        let outlines = self.resolve_dict(catalog.get(b"Outlines").ok()?)?;
        outlines.get(b"First").ok()?.as_reference().ok()
    }

    fn collect_items(
        &self,
        first: ObjectId,
        items: &mut Vec<OutlineItem>,
        visited: &mut HashSet<ObjectId>,
    ) {
        let mut current = Some(first);
        while let Some(id) = current {
            if !visited.insert(id) {
                warn!("outline item {:?} visited twice, stopping", id);
                return;
            }
            let Ok(item) = self.inner.get_dictionary(id) else {
                warn!("outline item {:?} is not a dictionary", id);
                return;
            };

            let title = item
                .get(b"Title")
                .ok()
                .and_then(|title| self.inner.dereference(title).ok())
                .and_then(|(_, title)| title.as_str().ok())
                .map(decode_text)
                .unwrap_or_default();
            items.push(OutlineItem::new(title, self.locator_of(item)));

            if let Some(child) = item.get(b"First").ok().and_then(|o| o.as_reference().ok()) {
                self.collect_items(child, items, visited);
            }
            current = item.get(b"Next").ok().and_then(|o| o.as_reference().ok());
        }
    }

    fn locator_of(&self, item: &Dictionary) -> Option<PageLocator> {
        if let Ok(dest) = item.get(b"Dest") {
            return self.destination_locator(dest, 0);
        }
        let action = self.resolve_dict(item.get(b"A").ok()?)?;
        if action.get(b"S").ok()?.as_name().ok()? != b"GoTo" {
            return None;
        }
        self.destination_locator(action.get(b"D").ok()?, 0)
    }

    fn destination_locator(&self, dest: &Object, hops: usize) -> Option<PageLocator> {
        if hops > MAX_INDIRECTION {
            return None;
        }
        let (_, dest) = self.inner.dereference(dest).ok()?;
        match dest {
            Object::Array(parts) => match parts.first()? {
                Object::Reference(page) => Some(PageLocator::Reference(page.0)),
                // Remote-style destinations carry a 0-based page index
                Object::Integer(index) => u32::try_from(*index)
                    .ok()
                    .map(|index| PageLocator::Page(index + 1)),
                _ => None,
            },
            Object::Dictionary(dict) => self.destination_locator(dict.get(b"D").ok()?, hops + 1),
            Object::Name(name) | Object::String(name, _) => {
                let target = self.named_destination(name)?;
                self.destination_locator(target, hops + 1)
            }
            _ => None,
        }
    }

    fn named_destination(&self, name: &[u8]) -> Option<&Object> {
        let catalog = self.inner.catalog().ok()?;
        if let Some(dests) = catalog.get(b"Dests").ok().and_then(|d| self.resolve_dict(d)) {
            if let Ok(dest) = dests.get(name) {
                return Some(dest);
            }
        }
        let names = self.resolve_dict(catalog.get(b"Names").ok()?)?;
        let tree = self.resolve_dict(names.get(b"Dests").ok()?)?;
        self.search_name_tree(tree, name, 0)
    }

    fn search_name_tree<'a>(
        &'a self,
        node: &'a Dictionary,
        name: &[u8],
        depth: usize,
    ) -> Option<&'a Object> {
        if depth > MAX_INDIRECTION {
            return None;
        }
        if let Ok(pairs) = node.get(b"Names").and_then(Object::as_array) {
            for pair in pairs.chunks_exact(2) {
                if pair[0].as_str().ok() == Some(name) {
                    return Some(&pair[1]);
                }
            }
        }
        let kids = node.get(b"Kids").and_then(Object::as_array).ok()?;
        kids.iter()
            .filter_map(|kid| self.resolve_dict(kid))
            .find_map(|kid| self.search_name_tree(kid, name, depth + 1))
    }
}

/// Object ids of the first and last item of one sibling list, plus the number of
/// items it contains including all descendants.
struct ItemSpan {
    first: ObjectId,
    last: ObjectId,
    count: i64,
}

fn page_for(pages: &[ObjectId], page_number: u32) -> ObjectId {
    // 1-based page number to 0-based page index
    let index = (page_number as usize).saturating_sub(1);
    if index >= pages.len() {
        warn!(
            "page {} beyond last page {}, pointing at last page",
            page_number,
            pages.len()
        );
    }
    pages[index.min(pages.len() - 1)]
}

fn write_items(
    doc: &mut lopdf::Document,
    pages: &[ObjectId],
    nodes: &[Node],
    parent: ObjectId,
) -> Option<ItemSpan> {
    let ids: Vec<ObjectId> = nodes.iter().map(|_| doc.new_object_id()).collect();
    let mut count = 0;

    for (i, node) in nodes.iter().enumerate() {
        let mut item = Dictionary::new();
        item.set("Title", encode_text(&node.title));
        item.set("Parent", Object::Reference(parent));
        if i > 0 {
            item.set("Prev", Object::Reference(ids[i - 1]));
        }
        if let Some(next) = ids.get(i + 1) {
            item.set("Next", Object::Reference(*next));
        }
        item.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(page_for(pages, node.page_number)),
                Object::Name(b"Fit".to_vec()),
            ]),
        );
        if let Some(children) = write_items(doc, pages, &node.children, ids[i]) {
            item.set("First", Object::Reference(children.first));
            item.set("Last", Object::Reference(children.last));
            item.set("Count", Object::Integer(children.count));
            count += children.count;
        }
        doc.objects.insert(ids[i], Object::Dictionary(item));
        count += 1;
    }

    Some(ItemSpan {
        first: *ids.first()?,
        last: *ids.last()?,
        count,
    })
}

impl Document for PdfDocument {
    fn list_pages(&self) -> Vec<PageHandle> {
        self.inner
            .get_pages()
            .into_iter()
            .map(|(number, page_id)| PageHandle {
                number,
                content_id: self.content_id(page_id),
            })
            .collect()
    }

    fn read_outline(&self) -> Vec<OutlineItem> {
        let mut items = Vec::new();
        if let Some(first) = self.first_outline_item() {
            self.collect_items(first, &mut items, &mut HashSet::new());
        }
        debug!("read_outline: {} items", items.len());
        items
    }

    fn write_outline(&self, forest: &[Node], output: &Path) -> io::Result<()> {
        let mut doc = self.inner.clone();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() && !forest.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "document has no pages to point bookmarks at",
            ));
        }
        let catalog_id = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(pdf_err)?;

        let outlines_id = doc.new_object_id();
        let span = write_items(&mut doc, &pages, forest, outlines_id);

        let catalog = doc
            .get_object_mut(catalog_id)
            .and_then(Object::as_dict_mut)
            .map_err(pdf_err)?;
        catalog.remove(b"Outlines");
        if let Some(span) = span {
            catalog.set("Outlines", Object::Reference(outlines_id));
            catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

            let mut outlines = Dictionary::new();
            outlines.set("Type", Object::Name(b"Outlines".to_vec()));
            outlines.set("First", Object::Reference(span.first));
            outlines.set("Last", Object::Reference(span.last));
            outlines.set("Count", Object::Integer(span.count));
            doc.objects.insert(outlines_id, Object::Dictionary(outlines));
        }

        let pruned = doc.prune_objects();
        debug!(
            "write_outline: {} items, {} stale objects pruned, output={}",
            forest_size(forest),
            pruned.len(),
            output.display()
        );
        persist_atomic(output, |tmp| doc.save_to(tmp))
    }
}
