use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "pagepick")]
#[command(about = "Pick pages out of PDFs and rename documents by their 8-digit identifier")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server holding an interactive session
    Mcp,

    /// Copy the given pages of every input PDF into new PDFs
    #[command(alias = "cat")]
    Extract {
        /// Pages in order (e.g., "1,3,5-7"; full-width digits are accepted)
        pages: String,

        /// PDF files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Copy a contiguous page range of every input PDF into new PDFs
    Range {
        /// First page
        start: String,

        /// Last page
        end: String,

        /// PDF files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Drop the last page of every input PDF
    #[command(alias = "drop-last")]
    TrimLast {
        /// PDF files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print the 8-digit identifier found in each document
    Identify {
        /// .doc/.docx/.pdf files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Copy each document into the output directory as <identifier>.<ext>
    Rename {
        /// .doc/.docx/.pdf files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}
