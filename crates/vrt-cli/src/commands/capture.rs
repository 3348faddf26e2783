use anyhow::Result;
use std::path::Path;
use vrt_engine::Engine;

pub async fn handle(engine: &Engine, name: &str, image: &Path) -> Result<()> {
    let outcome = engine.capture(name, image).await?;
    let decision = &outcome.decision;

    if decision.should_use_baseline {
        println!("✓ Stored baseline: {}", outcome.name);
        if !decision.is_main_branch {
            println!("  No baseline existed yet on '{}'", outcome.branch);
        }
    } else {
        println!("✓ Captured for comparison: {}", outcome.name);
    }
    println!("  Path: {}", decision.target().display());

    Ok(())
}
