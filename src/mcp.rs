use std::sync::Arc;

use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};

use crate::batch::{DocId, Outcome};
use crate::config::Config;
use crate::error::ValidationError;
use crate::session::{BulkPanel, DocumentView, Outcomes, PageInputs, Session, Target};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoadRequest {
    #[schemars(description = "Files or directories to add to the working set")]
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExtractPagesRequest {
    #[schemars(description = "Pages in output order (e.g., '1,3,5-7'). Full-width digits and dashes are accepted")]
    pub pages: String,
    #[schemars(description = "Document to process; omit to process every loaded document")]
    pub document_id: Option<u64>,
    #[schemars(description = "Directory to write results into (default: configured output directory)")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExtractRangeRequest {
    #[schemars(description = "First page of the range")]
    pub start: String,
    #[schemars(description = "Last page of the range")]
    pub end: String,
    #[schemars(description = "Document to process; omit to process every loaded document")]
    pub document_id: Option<u64>,
    #[schemars(description = "Directory to write results into (default: configured output directory)")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScanRequest {
    #[schemars(description = "Document to scan; omit to scan every loaded document")]
    pub document_id: Option<u64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TargetRequest {
    #[schemars(description = "Document to process; omit to process every loaded document")]
    pub document_id: Option<u64>,
    #[schemars(description = "Directory to write results into (default: configured output directory)")]
    pub output_dir: Option<String>,
}

#[derive(Clone)]
pub struct PagePickServer {
    session: Arc<Session>,
    config: Arc<Config>,
    tool_router: ToolRouter<Self>,
}

impl PagePickServer {
    pub fn new(config: Config) -> Self {
        Self {
            session: Arc::new(Session::default()),
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }
}

fn target(document_id: Option<u64>) -> Target {
    Target::from(document_id.map(DocId::new))
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

fn outcomes_json<T: Serialize>(
    outcomes: std::result::Result<Outcomes<T>, ValidationError>,
) -> String {
    match outcomes {
        Ok(outcomes) => {
            let result: Vec<OutcomeResult<T>> = outcomes
                .into_iter()
                .map(|(id, outcome)| OutcomeResult::new(id, outcome))
                .collect();
            to_json(&result)
        }
        Err(e) => format!("Error: {}", e),
    }
}

#[tool_router]
impl PagePickServer {
    #[tool(description = "Add PDFs to the page-extraction working set. Directories are searched recursively; non-PDF files are skipped")]
    async fn pdf_load(&self, Parameters(LoadRequest { paths }): Parameters<LoadRequest>) -> String {
        match self.session.pdf.load(&paths).await {
            Ok(loaded) => to_json(&loaded),
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "List loaded PDFs with their status, last inputs and output file name, plus the bulk panel state")]
    async fn pdf_list(&self) -> String {
        let result = PdfListResult {
            documents: self.session.pdf.list().await,
            bulk: self.session.pdf.bulk(),
        };
        to_json(&result)
    }

    #[tool(description = "Remove every PDF from the page-extraction working set")]
    async fn pdf_reset(&self) -> String {
        self.session.pdf.reset().await;
        "Page-extraction working set cleared".to_string()
    }

    #[tool(description = "Copy the listed pages, in the listed order, into a new PDF per document. Pages outside the document are skipped")]
    async fn pdf_extract_pages(&self, Parameters(req): Parameters<ExtractPagesRequest>) -> String {
        let delivery = self.config.delivery(req.output_dir.as_deref());
        outcomes_json(
            self.session
                .pdf
                .extract_pages(target(req.document_id), &req.pages, &delivery)
                .await,
        )
    }

    #[tool(description = "Copy pages start..=end into a new PDF per document")]
    async fn pdf_extract_range(&self, Parameters(req): Parameters<ExtractRangeRequest>) -> String {
        let delivery = self.config.delivery(req.output_dir.as_deref());
        outcomes_json(
            self.session
                .pdf
                .extract_range(target(req.document_id), &req.start, &req.end, &delivery)
                .await,
        )
    }

    #[tool(description = "Write each document without its last page. Single-page documents fail")]
    async fn pdf_trim_last(&self, Parameters(req): Parameters<TargetRequest>) -> String {
        let delivery = self.config.delivery(req.output_dir.as_deref());
        outcomes_json(
            self.session
                .pdf
                .trim_last(target(req.document_id), &delivery)
                .await,
        )
    }

    #[tool(description = "Add .doc/.docx/.pdf files to the identifier working set. Directories are searched recursively")]
    async fn word_load(
        &self,
        Parameters(LoadRequest { paths }): Parameters<LoadRequest>,
    ) -> String {
        match self.session.word.load(&paths).await {
            Ok(loaded) => to_json(&loaded),
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "List loaded documents with their status, detected identifier and renamed file name")]
    async fn word_list(&self) -> String {
        to_json(&self.session.word.list().await)
    }

    #[tool(description = "Remove every document from the identifier working set")]
    async fn word_reset(&self) -> String {
        self.session.word.reset().await;
        "Identifier working set cleared".to_string()
    }

    #[tool(description = "Find the first standalone 8-digit identifier in each document's text")]
    async fn word_scan(&self, Parameters(req): Parameters<ScanRequest>) -> String {
        outcomes_json(self.session.word.scan(target(req.document_id)).await)
    }

    #[tool(description = "Copy each scanned document into the output directory as <identifier>.<extension>. Documents without an identifier are left out")]
    async fn word_rename(&self, Parameters(req): Parameters<TargetRequest>) -> String {
        let delivery = self.config.delivery(req.output_dir.as_deref());
        outcomes_json(
            self.session
                .word
                .rename(target(req.document_id), &delivery)
                .await,
        )
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct OutcomeResult<T> {
    pub document_id: u64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> OutcomeResult<T> {
    fn new(id: DocId, outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Success(value) => OutcomeResult {
                document_id: id.get(),
                ok: true,
                result: Some(value),
                error: None,
            },
            Outcome::Failure(reason) => OutcomeResult {
                document_id: id.get(),
                ok: false,
                result: None,
                error: Some(reason),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PdfListResult {
    pub documents: Vec<DocumentView<PageInputs>>,
    pub bulk: BulkPanel,
}

#[tool_handler]
impl ServerHandler for PagePickServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Page picking and identifier renaming tools. Load PDFs with pdf_load, then use \
                 pdf_extract_pages, pdf_extract_range or pdf_trim_last on one document_id or on \
                 all of them. Load Word documents with word_load, run word_scan to find each \
                 8-digit identifier, then word_rename to write <identifier>.<ext> copies."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let server = PagePickServer::new(config);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
