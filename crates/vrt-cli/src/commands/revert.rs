use anyhow::Result;
use vrt_engine::Engine;

pub async fn handle(engine: &Engine, short_sha: &str) -> Result<()> {
    let outcome = engine.revert(short_sha).await?;
    let entry = &outcome.plan.entry;

    println!("✓ Reverted to {} ({})", entry.short_sha, entry.message);
    for name in &outcome.restored {
        println!("  Restored baseline: {}", name);
    }
    for name in &outcome.failed_restores {
        eprintln!("  Warning: could not restore baseline for '{}'", name);
    }
    if !outcome.plan.rejected.is_empty() {
        println!("  Rejected in that commit: {}", outcome.plan.rejected.join(", "));
    }

    Ok(())
}
