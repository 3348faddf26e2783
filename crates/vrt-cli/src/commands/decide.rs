use anyhow::Result;
use vrt_core::DecisionAction;
use vrt_engine::Engine;

pub async fn handle(engine: &Engine, names: &[String], action: DecisionAction) -> Result<()> {
    let outcome = engine.decide(names, action).await?;

    let verb = match action {
        DecisionAction::Accept => "Approved",
        DecisionAction::Reject => "Rejected",
    };
    match outcome.update.ledger.commits.first() {
        Some(entry) => println!(
            "✓ {} {} test(s) on {} ({})",
            verb,
            names.len(),
            entry.short_sha,
            entry.branch
        ),
        None => println!("✓ {} {} test(s)", verb, names.len()),
    }
    if outcome.update.outcome.merged {
        println!("  Merged into the existing entry for this commit");
    }

    for name in &outcome.updated {
        println!("  Updated baseline: {}", name);
    }
    for name in &outcome.failed_updates {
        eprintln!("  Warning: could not update baseline for '{}'", name);
    }
    for short_sha in &outcome.update.outcome.dropped {
        println!("  Dropped from history: {}", short_sha);
    }

    Ok(())
}
