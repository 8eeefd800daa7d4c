use std::path::Path;
use std::sync::Arc;

use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::Result;
use crate::page_range::PageSpec;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Catalog entries that point at pages of the source and would be stale in a selection.
const PAGE_BOUND_CATALOG_KEYS: [&[u8]; 4] = [b"Outlines", b"PageLabels", b"Dests", b"OpenAction"];

/// An uploaded document: its file name and raw bytes. Cloning shares the bytes.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    bytes: Arc<[u8]>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        SourceDocument {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(SourceDocument::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A freshly built document, already serialized.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

pub struct PdfDocument {
    pub doc: Document,
}

impl PdfDocument {
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Ok(PdfDocument { doc })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Build a new document holding copies of `pages`, in the given order.
    ///
    /// Page numbers outside `1..=page_count` are skipped. Each selected page
    /// becomes its own object, so a page listed twice appears twice. The
    /// source is left untouched.
    pub fn select_pages(&self, pages: &[u32]) -> Result<Document> {
        let mut out = self.doc.clone();
        let by_number = out.get_pages();
        let root_id = out.catalog()?.get(b"Pages")?.as_reference()?;

        let mut kids = Vec::with_capacity(pages.len());
        for &number in pages {
            let Some(&page_id) = by_number.get(&number) else {
                debug!(
                    "skipping page {} (document has {} pages)",
                    number,
                    by_number.len()
                );
                continue;
            };
            let mut page = flatten_page(&out, page_id)?;
            page.set("Parent", root_id);
            kids.push(Object::Reference(out.add_object(page)));
        }

        let count = kids.len() as i64;
        let root = out.get_dictionary_mut(root_id)?;
        root.set("Kids", kids);
        root.set("Count", count);

        let catalog_id = out.trailer.get(b"Root")?.as_reference()?;
        let catalog = out.get_dictionary_mut(catalog_id)?;
        for key in PAGE_BOUND_CATALOG_KEYS {
            catalog.remove(key);
        }

        out.prune_objects();
        out.renumber_objects();
        Ok(out)
    }

    /// Serialize a document to bytes.
    pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        doc.save_to(&mut buf)?;
        Ok(buf)
    }
}

/// Clone a page dictionary, materializing attributes it inherits from
/// intermediate page-tree nodes so it can hang directly off the root.
fn flatten_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    let mut parent = page.get(b"Parent").and_then(|p| p.as_reference()).ok();
    let mut depth = 0;

    while let Some(node_id) = parent {
        depth += 1;
        if depth > 64 {
            break;
        }
        let node = doc.get_dictionary(node_id)?;
        for key in INHERITABLE {
            if page.has(key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                page.set(key.to_vec(), value.clone());
            }
        }
        parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }

    Ok(page)
}

/// Copy `pages` of `source` into a new document.
///
/// Decoding, page selection and serialization run on the blocking pool; the
/// await on that work is this operation's suspension point.
pub async fn assemble(source: &SourceDocument, pages: &[u32]) -> Result<AssembledDocument> {
    let bytes = Arc::clone(&source.bytes);
    let pages = pages.to_vec();
    tokio::task::spawn_blocking(move || {
        let pdf = PdfDocument::load(&bytes)?;
        build(&pdf, &pages)
    })
    .await?
}

/// Copy every page but the last. A single-page source is a validation error.
pub async fn trim_last(source: &SourceDocument) -> Result<AssembledDocument> {
    let bytes = Arc::clone(&source.bytes);
    tokio::task::spawn_blocking(move || {
        let pdf = PdfDocument::load(&bytes)?;
        let spec = PageSpec::all_but_last(pdf.page_count())?;
        build(&pdf, spec.pages())
    })
    .await?
}

fn build(pdf: &PdfDocument, pages: &[u32]) -> Result<AssembledDocument> {
    let mut doc = pdf.select_pages(pages)?;
    let page_count = doc.get_pages().len() as u32;
    let bytes = PdfDocument::to_bytes(&mut doc)?;
    Ok(AssembledDocument { bytes, page_count })
}
