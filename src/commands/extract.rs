use crate::config::Config;
use crate::session::{PdfPane, Target};
use anyhow::Result;
use std::path::Path;

pub async fn run<P: AsRef<Path>>(inputs: &[P], pages: &str, config: &Config) -> Result<()> {
    let pane = PdfPane::new();
    let names = super::names(&pane.load(inputs).await?)?;

    let outcomes = pane
        .extract_pages(Target::All, pages, &config.delivery(None))
        .await?;

    super::report(&names, &outcomes, |extracted| {
        format!(
            "extracted {} page(s) to {}",
            extracted.page_count,
            config.output_dir.join(&extracted.file_name).display()
        )
    })
}
