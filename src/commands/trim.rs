use crate::config::Config;
use crate::session::{PdfPane, Target};
use anyhow::Result;
use std::path::Path;

pub async fn run<P: AsRef<Path>>(inputs: &[P], config: &Config) -> Result<()> {
    let pane = PdfPane::new();
    let names = super::names(&pane.load(inputs).await?)?;

    let outcomes = pane.trim_last(Target::All, &config.delivery(None)).await?;

    super::report(&names, &outcomes, |trimmed| {
        format!(
            "kept {} page(s) in {}",
            trimmed.page_count,
            config.output_dir.join(&trimmed.file_name).display()
        )
    })
}
