use anyhow::Result;
use time::format_description::well_known::Rfc3339;
use vrt_engine::Engine;

pub async fn handle(engine: &Engine) -> Result<()> {
    let history = engine.history().await?;

    if history.commits.is_empty() {
        println!("No approval history.");
        return Ok(());
    }

    println!(
        "History ({} of at most {}):",
        history.commits.len(),
        history.max_history
    );
    for entry in &history.commits {
        println!("  {} {} ({})", entry.short_sha, entry.message, entry.branch);
        println!(
            "    {} <{}>, approved at {}",
            entry.author,
            entry.email,
            entry.approval_timestamp.format(&Rfc3339)?
        );
        println!(
            "    Accepted: {}  Rejected: {}",
            entry.summary.accepted, entry.summary.rejected
        );
    }

    Ok(())
}
