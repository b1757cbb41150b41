//! `haul report`: re-render a saved final artifact

use anyhow::{Context, Result};
use std::path::Path;

use haul::report::{FinalArtifact, Reporter};

pub fn report(artifact: &Path) -> Result<()> {
    let content = std::fs::read_to_string(artifact)
        .with_context(|| format!("Failed to read artifact: {}", artifact.display()))?;

    let artifact_data: FinalArtifact = serde_json::from_str(&content)
        .with_context(|| format!("Not a final results artifact: {}", artifact.display()))?;

    print!(
        "{}",
        Reporter::render(&artifact_data.results, &artifact_data.summary)
    );
    Ok(())
}
