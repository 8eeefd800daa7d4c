use std::future::Future;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use log::info;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::batch::{run_batch, DocId, Outcome, Slot, SlotStatus, WorkingSet};
use crate::delivery::{output_file_name, Delivery};
use crate::error::{Result, ValidationError};
use crate::identifier::{self, renamed_file_name, IdentifierScan};
use crate::intake::{collect_inputs, IDENTIFIER_EXTENSIONS, PDF_EXTENSIONS};
use crate::page_range::PageSpec;
use crate::pdf::{self, AssembledDocument, SourceDocument};
use crate::text::Extractors;

pub type Outcomes<T> = Vec<(DocId, Outcome<T>)>;

/// Which documents of a pane an operation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    One(DocId),
    All,
}

impl From<Option<DocId>> for Target {
    fn from(id: Option<DocId>) -> Self {
        id.map(Target::One).unwrap_or(Target::All)
    }
}

/// The last inputs entered for a document (or for the bulk panel).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageInputs {
    pub pages: String,
    pub range_start: String,
    pub range_end: String,
}

/// State of the bulk-operation panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkPanel {
    pub inputs: PageInputs,
    pub in_progress: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extracted {
    pub file_name: String,
    pub page_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loaded {
    pub id: DocId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentView<S> {
    pub id: DocId,
    pub name: String,
    pub output_name: Option<String>,
    pub status: SlotStatus,
    pub state: S,
}

async fn load_into<S: Clone + Default>(
    set: &RwLock<WorkingSet<S>>,
    paths: &[impl AsRef<Path>],
    extensions: &[&str],
) -> anyhow::Result<Vec<Loaded>> {
    let files = collect_inputs(paths, extensions)?;
    let mut documents = Vec::with_capacity(files.len());
    for file in &files {
        let doc = SourceDocument::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        documents.push(doc);
    }

    let mut set = set.write().await;
    let loaded = documents
        .into_iter()
        .map(|doc| {
            let name = doc.name().to_string();
            Loaded {
                id: set.add(doc),
                name,
            }
        })
        .collect::<Vec<_>>();
    info!("loaded {} document(s)", loaded.len());
    Ok(loaded)
}

/// Page extraction pane: PDFs plus per-document and bulk extraction.
pub struct PdfPane {
    set: RwLock<WorkingSet<PageInputs>>,
    bulk: Mutex<BulkPanel>,
}

impl PdfPane {
    pub fn new() -> Self {
        PdfPane {
            set: RwLock::new(WorkingSet::new()),
            bulk: Mutex::new(BulkPanel::default()),
        }
    }

    pub async fn add(&self, document: SourceDocument) -> DocId {
        self.set.write().await.add(document)
    }

    /// Load PDFs from files or directories; other file types are skipped.
    pub async fn load<P: AsRef<Path>>(&self, paths: &[P]) -> anyhow::Result<Vec<Loaded>> {
        load_into(&self.set, paths, PDF_EXTENSIONS).await
    }

    /// Forget every document and clear the bulk panel. Waits for running batches.
    pub async fn reset(&self) {
        let mut set = self.set.write().await;
        set.reset();
        *self.lock_bulk() = BulkPanel::default();
    }

    pub async fn list(&self) -> Vec<DocumentView<PageInputs>> {
        self.set
            .read()
            .await
            .snapshot()
            .into_iter()
            .map(|entry| DocumentView {
                id: entry.id,
                name: entry.document.name().to_string(),
                output_name: Some(output_file_name(entry.document.name())),
                status: entry.slot.status.clone(),
                state: entry.slot.state.clone(),
            })
            .collect()
    }

    pub fn bulk(&self) -> BulkPanel {
        self.lock_bulk().clone()
    }

    /// Extract pages named by a spec like "1,3,5-7".
    pub async fn extract_pages(
        &self,
        target: Target,
        pages: &str,
        delivery: &dyn Delivery,
    ) -> std::result::Result<Outcomes<Extracted>, ValidationError> {
        let spec = self
            .check(target, PageSpec::parse(pages), |inputs| {
                inputs.pages = pages.to_string()
            })
            .await?;
        let pages = spec.pages();
        self.dispatch(target, delivery, |doc| async move {
            pdf::assemble(&doc, pages).await
        })
        .await
    }

    /// Extract the contiguous range `start..=end`.
    pub async fn extract_range(
        &self,
        target: Target,
        start: &str,
        end: &str,
        delivery: &dyn Delivery,
    ) -> std::result::Result<Outcomes<Extracted>, ValidationError> {
        let spec = self
            .check(target, PageSpec::from_range(start, end), |inputs| {
                inputs.range_start = start.to_string();
                inputs.range_end = end.to_string();
            })
            .await?;
        let pages = spec.pages();
        self.dispatch(target, delivery, |doc| async move {
            pdf::assemble(&doc, pages).await
        })
        .await
    }

    /// Drop the last page. Single-page documents fail individually.
    pub async fn trim_last(
        &self,
        target: Target,
        delivery: &dyn Delivery,
    ) -> std::result::Result<Outcomes<Extracted>, ValidationError> {
        self.check(target, Ok(()), |_| {}).await?;
        self.dispatch(target, delivery, |doc| async move {
            pdf::trim_last(&doc).await
        })
        .await
    }

    /// Record the inputs on the target and surface a validation failure there:
    /// on the document's slot for a single run, on the bulk panel otherwise.
    async fn check<T>(
        &self,
        target: Target,
        checked: std::result::Result<T, ValidationError>,
        record: impl FnOnce(&mut PageInputs),
    ) -> std::result::Result<T, ValidationError> {
        match target {
            Target::One(id) => {
                let set = self.set.read().await;
                if !set.contains(id) {
                    return Err(ValidationError::UnknownDocument(id));
                }
                set.update(id, |slot| {
                    let mut state = slot.state.clone();
                    record(&mut state);
                    let status = match &checked {
                        Ok(_) => slot.status.clone(),
                        Err(e) => SlotStatus::Failed(e.to_string()),
                    };
                    Slot { status, state }
                });
            }
            Target::All => {
                let mut bulk = self.lock_bulk();
                record(&mut bulk.inputs);
                bulk.error = checked.as_ref().err().map(|e| e.to_string());
            }
        }
        checked
    }

    async fn dispatch<F, Fut>(
        &self,
        target: Target,
        delivery: &dyn Delivery,
        operation: F,
    ) -> std::result::Result<Outcomes<Extracted>, ValidationError>
    where
        F: Fn(SourceDocument) -> Fut,
        Fut: Future<Output = Result<AssembledDocument>>,
    {
        let set = self.set.read().await;
        let ids = match target {
            Target::One(id) if !set.contains(id) => {
                return Err(ValidationError::UnknownDocument(id))
            }
            Target::One(id) => vec![id],
            Target::All => {
                self.lock_bulk().in_progress = true;
                set.ids()
            }
        };

        let operation = &operation;
        let outcomes = run_batch(&set, &ids, |doc| async move {
            let name = output_file_name(doc.name());
            let assembled = operation(doc).await?;
            let file_name = delivery.deliver(&assembled.bytes, &name)?;
            Ok(Extracted {
                file_name,
                page_count: assembled.page_count,
            })
        })
        .await;

        if target == Target::All {
            self.lock_bulk().in_progress = false;
        }
        Ok(outcomes)
    }

    fn lock_bulk(&self) -> std::sync::MutexGuard<'_, BulkPanel> {
        self.bulk.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PdfPane {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-document state of the identifier pane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WordState {
    pub scan: Option<IdentifierScan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Renamed {
    pub file_name: String,
}

/// Identifier pane: scan documents for their 8-digit number and deliver
/// renamed copies.
pub struct WordPane {
    set: RwLock<WorkingSet<WordState>>,
    extractors: Extractors,
}

impl WordPane {
    pub fn new(extractors: Extractors) -> Self {
        WordPane {
            set: RwLock::new(WorkingSet::new()),
            extractors,
        }
    }

    pub async fn add(&self, document: SourceDocument) -> DocId {
        self.set.write().await.add(document)
    }

    /// Load .doc/.docx (and .pdf) files or directories.
    pub async fn load<P: AsRef<Path>>(&self, paths: &[P]) -> anyhow::Result<Vec<Loaded>> {
        load_into(&self.set, paths, IDENTIFIER_EXTENSIONS).await
    }

    pub async fn reset(&self) {
        self.set.write().await.reset();
    }

    pub async fn list(&self) -> Vec<DocumentView<WordState>> {
        self.set
            .read()
            .await
            .snapshot()
            .into_iter()
            .map(|entry| {
                let output_name = entry
                    .slot
                    .state
                    .scan
                    .as_ref()
                    .and_then(IdentifierScan::identifier)
                    .map(|id| renamed_file_name(id, entry.document.name()));
                DocumentView {
                    id: entry.id,
                    name: entry.document.name().to_string(),
                    output_name,
                    status: entry.slot.status.clone(),
                    state: entry.slot.state.clone(),
                }
            })
            .collect()
    }

    /// Extract each document's text and record the identifier found, if any.
    pub async fn scan(
        &self,
        target: Target,
    ) -> std::result::Result<Outcomes<IdentifierScan>, ValidationError> {
        let set = self.set.read().await;
        let ids = match target {
            Target::One(id) if !set.contains(id) => {
                return Err(ValidationError::UnknownDocument(id))
            }
            Target::One(id) => vec![id],
            Target::All => set.ids(),
        };

        let outcomes = run_batch(&set, &ids, |doc| async move {
            let extractor = self.extractors.for_name(doc.name())?;
            identifier::scan(&doc, extractor).await
        })
        .await;

        for (id, outcome) in &outcomes {
            if let Outcome::Success(scan) = outcome {
                set.update(*id, |slot| Slot {
                    status: slot.status.clone(),
                    state: WordState {
                        scan: Some(scan.clone()),
                    },
                });
            }
        }
        Ok(outcomes)
    }

    /// Deliver each scanned document, unchanged, as `<identifier>.<ext>`.
    ///
    /// A single document without an identifier is an error; in bulk, documents
    /// without one are left out and only an all-miss set is an error.
    pub async fn rename(
        &self,
        target: Target,
        delivery: &dyn Delivery,
    ) -> std::result::Result<Outcomes<Renamed>, ValidationError> {
        let set = self.set.read().await;
        let candidates = match target {
            Target::One(id) if !set.contains(id) => {
                return Err(ValidationError::UnknownDocument(id))
            }
            Target::One(id) => vec![id],
            Target::All => set.ids(),
        };

        let named: Vec<(DocId, String)> = candidates
            .into_iter()
            .filter_map(|id| {
                let slot = set.slot(id)?;
                let identifier = slot.state.scan.as_ref()?.identifier()?.to_string();
                let document = set.document(id)?;
                Some((id, renamed_file_name(&identifier, document.name())))
            })
            .collect();
        if named.is_empty() {
            return Err(ValidationError::NoIdentifier);
        }

        let mut outcomes = Vec::with_capacity(named.len());
        for (id, file_name) in named {
            let Some(document) = set.document(id) else {
                continue;
            };
            let outcome = match delivery.deliver(document.bytes(), &file_name) {
                Ok(file_name) => Outcome::Success(Renamed { file_name }),
                Err(e) => Outcome::Failure(e.to_string()),
            };
            outcomes.push((id, outcome));
        }
        Ok(outcomes)
    }
}

impl Default for WordPane {
    fn default() -> Self {
        WordPane::new(Extractors::default())
    }
}

/// Both panes of one interactive session.
#[derive(Default)]
pub struct Session {
    pub pdf: PdfPane,
    pub word: WordPane,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::delivery::capture::MemoryDelivery;
    use crate::delivery::DirectoryDelivery;
    use crate::pdf::document::fixtures::{page_markers, sample_pdf};
    use crate::word::fixtures::sample_docx;
    use crate::word::DocxText;

    async fn pane_with(docs: Vec<(&str, Vec<u8>)>) -> (PdfPane, Vec<DocId>) {
        let pane = PdfPane::new();
        let mut ids = Vec::new();
        for (name, bytes) in docs {
            ids.push(pane.add(SourceDocument::new(name, bytes)).await);
        }
        (pane, ids)
    }

    #[tokio::test]
    async fn test_single_extract_delivers_and_records_inputs() {
        let (pane, ids) = pane_with(vec![("report.pdf", sample_pdf(5))]).await;
        let out = MemoryDelivery::default();

        let outcomes = pane
            .extract_pages(Target::One(ids[0]), "５，１－２", &out)
            .await
            .unwrap();

        assert_eq!(
            outcomes,
            vec![(
                ids[0],
                Outcome::Success(Extracted {
                    file_name: "report.pdf".into(),
                    page_count: 3,
                })
            )]
        );
        let bytes = out.get("report.pdf").unwrap();
        assert_eq!(page_markers(&bytes), ["Page 5", "Page 1", "Page 2"]);

        let view = &pane.list().await[0];
        assert_eq!(view.status, SlotStatus::Succeeded);
        assert_eq!(view.state.pages, "５，１－２");
    }

    #[tokio::test]
    async fn test_single_validation_error_marks_only_that_slot() {
        let (pane, ids) =
            pane_with(vec![("a.pdf", sample_pdf(2)), ("b.pdf", sample_pdf(2))]).await;
        let out = MemoryDelivery::default();

        let err = pane
            .extract_pages(Target::One(ids[0]), "abc", &out)
            .await
            .unwrap_err();
        assert_eq!(err, ValidationError::NoPages);

        let views = pane.list().await;
        assert_eq!(views[0].status, SlotStatus::Failed("no pages specified".into()));
        assert_eq!(views[1].status, SlotStatus::Idle);
        assert!(out.names().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_validation_error_never_starts_batch() {
        let (pane, _) = pane_with(vec![("a.pdf", sample_pdf(2))]).await;
        let out = MemoryDelivery::default();

        let err = pane
            .extract_range(Target::All, "5", "2", &out)
            .await
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidRange);

        let bulk = pane.bulk();
        assert_eq!(bulk.error.as_deref(), Some("invalid range"));
        assert!(!bulk.in_progress);
        assert_eq!(bulk.inputs.range_start, "5");
        assert_eq!(pane.list().await[0].status, SlotStatus::Idle);
        assert!(out.names().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_extract_isolates_corrupt_document() {
        let (pane, ids) = pane_with(vec![
            ("one.pdf", sample_pdf(3)),
            ("two.pdf", b"%PDF-1.7 truncated".to_vec()),
            ("three.pdf", sample_pdf(1)),
        ])
        .await;
        let out = MemoryDelivery::default();

        let outcomes = pane.extract_range(Target::All, "1", "2", &out).await.unwrap();

        let ok: Vec<_> = outcomes.iter().map(|(_, o)| o.is_success()).collect();
        assert_eq!(ok, [true, false, true]);
        assert_eq!(outcomes[1].0, ids[1]);
        assert_eq!(out.names(), ["one.pdf", "three.pdf"]);
        // page 2 does not exist in a one-page source
        assert_eq!(page_markers(&out.get("three.pdf").unwrap()), ["Page 1"]);

        let bulk = pane.bulk();
        assert_eq!(bulk.error, None);
        assert!(!bulk.in_progress);
        assert!(matches!(pane.list().await[1].status, SlotStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_bulk_trim_fails_single_page_document_only() {
        let (pane, _) = pane_with(vec![
            ("long.pdf", sample_pdf(3)),
            ("short.pdf", sample_pdf(1)),
        ])
        .await;
        let out = MemoryDelivery::default();

        let outcomes = pane.trim_last(Target::All, &out).await.unwrap();

        assert!(outcomes[0].1.is_success());
        assert_eq!(
            outcomes[1].1,
            Outcome::Failure("cannot remove the only page".into())
        );
        assert_eq!(out.names(), ["long.pdf"]);
        assert_eq!(
            page_markers(&out.get("long.pdf").unwrap()),
            ["Page 1", "Page 2"]
        );
    }

    #[tokio::test]
    async fn test_unknown_document() {
        let (pane, _) = pane_with(vec![]).await;
        let out = MemoryDelivery::default();
        let missing = DocId::new(99);
        assert_eq!(
            pane.trim_last(Target::One(missing), &out).await.unwrap_err(),
            ValidationError::UnknownDocument(missing)
        );
    }

    #[tokio::test]
    async fn test_reset_clears_documents_and_bulk_panel() {
        let (pane, _) = pane_with(vec![("a.pdf", sample_pdf(1))]).await;
        let out = MemoryDelivery::default();
        let _ = pane.extract_pages(Target::All, "", &out).await;
        assert!(pane.bulk().error.is_some());

        pane.reset().await;
        assert!(pane.list().await.is_empty());
        assert_eq!(pane.bulk(), BulkPanel::default());
    }

    #[tokio::test]
    async fn test_load_filters_to_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), sample_pdf(1)).unwrap();
        std::fs::write(dir.path().join("a.docx"), b"").unwrap();

        let pane = PdfPane::new();
        let loaded = pane.load(&[dir.path()]).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "a.pdf");
    }

    #[tokio::test]
    async fn test_bulk_extract_keeps_outputs_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        for (sub, pages) in [("a", 3), ("b", 5)] {
            std::fs::create_dir(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("x.pdf"), sample_pdf(pages)).unwrap();
        }
        let out_dir = dir.path().join("out");

        let pane = PdfPane::new();
        pane.load(&[dir.path().join("a"), dir.path().join("b")])
            .await
            .unwrap();
        let outcomes = pane
            .extract_pages(Target::All, "1-5", &DirectoryDelivery::new(&out_dir))
            .await
            .unwrap();

        let mut delivered: Vec<(String, u32)> = outcomes
            .into_iter()
            .map(|(_, outcome)| match outcome {
                Outcome::Success(extracted) => (extracted.file_name, extracted.page_count),
                Outcome::Failure(reason) => panic!("unexpected failure: {}", reason),
            })
            .collect();
        delivered.sort();
        let names: Vec<_> = delivered.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["x (1).pdf", "x.pdf"]);

        let mut counts: Vec<_> = delivered.iter().map(|(_, count)| *count).collect();
        counts.sort();
        assert_eq!(counts, [3, 5]);
        for (name, count) in &delivered {
            let bytes = std::fs::read(out_dir.join(name)).unwrap();
            assert_eq!(page_markers(&bytes).len(), *count as usize);
        }
    }

    #[tokio::test]
    async fn test_output_into_source_directory_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_pdf(2);
        std::fs::write(dir.path().join("x.pdf"), &source).unwrap();

        let pane = PdfPane::new();
        pane.load(&[dir.path()]).await.unwrap();
        let outcomes = pane
            .trim_last(Target::All, &DirectoryDelivery::new(dir.path()))
            .await
            .unwrap();

        assert!(outcomes[0].1.is_success());
        assert_eq!(std::fs::read(dir.path().join("x.pdf")).unwrap(), source);
        let trimmed = std::fs::read(dir.path().join("x (1).pdf")).unwrap();
        assert_eq!(page_markers(&trimmed), ["Page 1"]);
    }

    fn word_pane() -> WordPane {
        let mut extractors = Extractors::empty();
        extractors.register("docx", Arc::new(DocxText));
        WordPane::new(extractors)
    }

    #[tokio::test]
    async fn test_scan_and_rename() {
        let pane = word_pane();
        let form = sample_docx(&["整理番号：１２３４５６７８"]);
        let hit = pane
            .add(SourceDocument::new("申請書.docx", form.clone()))
            .await;
        let miss = pane
            .add(SourceDocument::new("memo.docx", sample_docx(&["no number"])))
            .await;
        let broken = pane
            .add(SourceDocument::new("broken.docx", b"nope".to_vec()))
            .await;

        let scans = pane.scan(Target::All).await.unwrap();
        assert_eq!(scans[0].1, Outcome::Success(IdentifierScan::Found("12345678".into())));
        assert_eq!(scans[1].1, Outcome::Success(IdentifierScan::NoMatch));
        assert!(!scans[2].1.is_success());

        let views = pane.list().await;
        assert_eq!(views[0].output_name.as_deref(), Some("12345678.docx"));
        assert_eq!(views[1].output_name, None);
        assert!(matches!(views[2].status, SlotStatus::Failed(_)));

        let out = MemoryDelivery::default();
        assert_eq!(
            pane.rename(Target::One(miss), &out).await.unwrap_err(),
            ValidationError::NoIdentifier
        );
        assert_eq!(
            pane.rename(Target::One(broken), &out).await.unwrap_err(),
            ValidationError::NoIdentifier
        );

        let renamed = pane.rename(Target::All, &out).await.unwrap();
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0].0, hit);
        assert_eq!(out.names(), ["12345678.docx"]);
        // content is delivered untouched
        assert_eq!(out.get("12345678.docx").unwrap(), form);
    }

    #[tokio::test]
    async fn test_rename_with_shared_identifier_keeps_both() {
        let pane = word_pane();
        let first = sample_docx(&["12345678"]);
        let second = sample_docx(&["番号", "12345678", "写し"]);
        pane.add(SourceDocument::new("a.docx", first.clone())).await;
        pane.add(SourceDocument::new("b.docx", second.clone())).await;
        pane.scan(Target::All).await.unwrap();

        let out = MemoryDelivery::default();
        let renamed = pane.rename(Target::All, &out).await.unwrap();
        assert_eq!(
            renamed[1].1,
            Outcome::Success(Renamed {
                file_name: "12345678 (1).docx".into()
            })
        );
        assert_eq!(out.names(), ["12345678 (1).docx", "12345678.docx"]);
        assert_eq!(out.get("12345678.docx").unwrap(), first);
        assert_eq!(out.get("12345678 (1).docx").unwrap(), second);
    }

    #[tokio::test]
    async fn test_rename_before_scan_is_error() {
        let pane = word_pane();
        pane.add(SourceDocument::new("a.docx", sample_docx(&["12345678"])))
            .await;
        let out = MemoryDelivery::default();
        assert_eq!(
            pane.rename(Target::All, &out).await.unwrap_err(),
            ValidationError::NoIdentifier
        );
    }

    #[tokio::test]
    async fn test_unsupported_extension_fails_its_slot() {
        let pane = word_pane();
        pane.add(SourceDocument::new("scan.pdf", sample_pdf(1))).await;
        let scans = pane.scan(Target::All).await.unwrap();
        assert_eq!(
            scans[0].1,
            Outcome::Failure("unsupported document type: scan.pdf".into())
        );
    }
}
