use crate::batch::Outcome;
use crate::config::Config;
use crate::session::{Target, WordPane};
use anyhow::Result;
use log::warn;
use std::path::Path;

pub async fn run<P: AsRef<Path>>(inputs: &[P], config: &Config) -> Result<()> {
    let pane = WordPane::default();
    let names = super::names(&pane.load(inputs).await?)?;

    let scanned = pane.scan(Target::All).await?;
    for (id, outcome) in &scanned {
        let name = names.get(id).map(String::as_str).unwrap_or("?");
        match outcome {
            Outcome::Success(scan) if scan.identifier().is_none() => {
                warn!("{}: no 8-digit identifier, not renamed", name)
            }
            Outcome::Failure(reason) => warn!("{}: {}", name, reason),
            Outcome::Success(_) => {}
        }
    }

    let outcomes = pane.rename(Target::All, &config.delivery(None)).await?;

    super::report(&names, &outcomes, |renamed| {
        format!("copied to {}", config.output_dir.join(&renamed.file_name).display())
    })
}
