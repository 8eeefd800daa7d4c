pub mod document;
pub mod text;

pub use document::{assemble, trim_last, AssembledDocument, SourceDocument};
