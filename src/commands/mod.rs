pub mod extract;
pub mod identify;
pub mod range;
pub mod rename;
pub mod trim;

use std::collections::HashMap;

use anyhow::Result;

use crate::batch::{DocId, Outcome};
use crate::session::{Loaded, Outcomes};

/// Print one line per document and fail if any document failed.
fn report<T>(
    names: &HashMap<DocId, String>,
    outcomes: &Outcomes<T>,
    describe: impl Fn(&T) -> String,
) -> Result<()> {
    let mut failed = 0;
    for (id, outcome) in outcomes {
        let name = names.get(id).map(String::as_str).unwrap_or("?");
        match outcome {
            Outcome::Success(value) => println!("{}: {}", name, describe(value)),
            Outcome::Failure(reason) => {
                failed += 1;
                println!("{}: error: {}", name, reason);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} document(s) failed", failed, outcomes.len());
    }
    Ok(())
}

fn names(loaded: &[Loaded]) -> Result<HashMap<DocId, String>> {
    if loaded.is_empty() {
        anyhow::bail!("No matching documents found in the given inputs");
    }
    Ok(loaded
        .iter()
        .map(|doc| (doc.id, doc.name.clone()))
        .collect())
}
