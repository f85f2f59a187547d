//! Basic intake example: register capabilities, then evaluate requests.
//!
//! Run with: `cargo run -p factory-intake --example intake_basic`
//! Set `RUST_LOG=debug` for more detail.

use std::sync::Arc;

use factory_intake::{
    CapabilityRecord, CapabilityRegistry, CriterionSet, IntakeConfig, IntakePipeline, RawSignals,
    StaticCapabilitySource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    factory_telemetry::init_telemetry("intake-basic")?;

    // Load the current capability listing
    let source = StaticCapabilitySource::new(vec![
        CapabilityRecord::new("invoice-ocr", "automated invoice data extraction and validation")
            .with_tags(["ocr", "finance", "pdf-parsing"])
            .with_category("financial"),
        CapabilityRecord::new("expense-auditor", "flags policy violations in employee expense claims")
            .with_tags(["finance", "compliance"])
            .with_category("financial"),
        CapabilityRecord::new("ticket-router", "routes service desk tickets to the right support queue")
            .with_tags(["itsm", "classification"])
            .with_category("it-ops"),
        CapabilityRecord::new("contract-review", "extracts obligations and risky clauses from vendor contracts")
            .with_tags(["pdf-parsing", "legal", "compliance"])
            .with_category("legal"),
    ]);
    let registry = Arc::new(CapabilityRegistry::new());
    let loaded = registry.reload_from(&source).await?;
    println!("Loaded {loaded} capabilities\n");

    let config = IntakeConfig::builder().top_k(3).min_similarity(0.05).build()?;
    let pipeline = IntakePipeline::builder().config(config).registry(Arc::clone(&registry)).build()?;

    // A request with explicit criterion values
    let decision = pipeline.evaluate_request(
        "extract and validate invoice data automatically",
        &CriterionSet::new(0.8, 0.7, 0.6, 0.9, 0.2),
        None,
    )?;
    println!("Request: extract and validate invoice data automatically");
    println!("  classification: {}", decision.classification);
    for m in &decision.matches {
        println!("  match: {} ({:.3}) {}", m.document_id, m.score, m.reason());
    }
    println!("  recommendation: {}\n", decision.recommendation);

    // A request described by raw intake signals
    let signals = RawSignals {
        category: "compliance".into(),
        problem_statement: "Collect GDPR data subject access requests from email".into(),
        estimated_impact: "high".into(),
        urgency: "critical".into(),
        resource_requirements: Some("moderate integration with the mail gateway".into()),
        ..Default::default()
    };
    let decision = pipeline.evaluate_request(&signals.problem_statement, &signals.to_criteria()?, None)?;
    println!("Request: {}", signals.problem_statement);
    println!("  classification: {}", decision.classification);
    if let Some(priority) = &decision.priority {
        println!("  priority: {} ({:.1})", priority.tier, priority.score);
        for line in &priority.reasoning {
            println!("    - {line}");
        }
    }
    println!("  recommendation: {}\n", decision.recommendation);

    // Reuse candidates within one business category
    println!("Financial capabilities like \"audit vendor invoices\":");
    for m in registry.snapshot().search_in_category("audit vendor invoices", "financial", 3)? {
        println!("  {} ({:.3})", m.document_id, m.score);
    }
    println!();

    // Tags worth packaging as shared components
    println!("Reusable components:");
    for component in registry.snapshot().reusable_components() {
        println!("  {} used by {}", component.tag, component.capability_ids.join(", "));
    }

    registry.close();
    Ok(())
}
