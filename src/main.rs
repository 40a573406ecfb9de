use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tradegraph::config::loader::ConfigLoader;
use tradegraph::models::GraphSnapshot;
use tradegraph::observability::init_tracing;
use tradegraph::services::{MetadataLabeler, create_knowledge_miner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    ConfigLoader::validate(&config).context("invalid configuration")?;
    let _guard = init_tracing(&config.logging)?;
    info!(
        "Starting {} ({}), insight backend: {}",
        config.app_name, config.environment, config.insight.backend
    );

    let path = std::env::args()
        .nth(1)
        .context("usage: tradegraph <snapshot.json>")?;
    let json = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read snapshot {}", path))?;
    let snapshot = GraphSnapshot::from_json(&json)?;
    info!(
        "Loaded snapshot {}: {} entities, {} relationships",
        path,
        snapshot.entities().len(),
        snapshot.relationships().len()
    );

    let miner = create_knowledge_miner(&config, Arc::new(MetadataLabeler))?;
    let report = miner.run(&snapshot).await;
    info!(
        "Report {}: {} structural patterns, {} training patterns, {} insights",
        report.version,
        report.structural_patterns.len(),
        report.training_patterns.len(),
        report.insights.len()
    );
    tracing::debug!("Mining metrics:\n{}", miner.metrics().gather());

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
