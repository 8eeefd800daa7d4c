use crate::identifier::IdentifierScan;
use crate::session::{Target, WordPane};
use anyhow::Result;
use std::path::Path;

pub async fn run<P: AsRef<Path>>(inputs: &[P]) -> Result<()> {
    let pane = WordPane::default();
    let names = super::names(&pane.load(inputs).await?)?;

    let outcomes = pane.scan(Target::All).await?;

    super::report(&names, &outcomes, |scan| match scan {
        IdentifierScan::Found(id) => id.clone(),
        IdentifierScan::NoMatch => "no 8-digit identifier".to_string(),
    })
}
