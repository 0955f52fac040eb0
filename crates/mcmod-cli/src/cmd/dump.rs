//! Dump command

use anyhow::{Context, Result};
use mcmod_schema::{DescriptorList, validate_descriptors};

use crate::source;

/// Load, validate and print the descriptor list at `source`.
pub async fn dump(source: &str, json: bool) -> Result<()> {
    let client = super::http_client()?;
    let artifacts = source::load(&client, source)
        .await
        .with_context(|| format!("Failed to load descriptor list from {source}"))?;
    validate_descriptors(&artifacts).context("Descriptor list is invalid")?;

    if json {
        let list = DescriptorList { artifacts };
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    let width = artifacts
        .iter()
        .map(|d| d.filename.len())
        .max()
        .unwrap_or(0);
    for d in &artifacts {
        println!("{:<width$}  {}  {}", d.filename, d.verification, d.url);
    }
    println!("{} artifacts", artifacts.len());
    Ok(())
}
