use anyhow::Result;
use vrt_core::TestRecord;
use vrt_engine::Engine;

pub async fn handle(engine: &Engine, reset: bool, all: bool) -> Result<()> {
    let outcome = engine.compare(reset).await?;
    let report = &outcome.report;
    let summary = report.summary();

    println!("✓ Wrote report: {}", outcome.report_path.display());
    println!(
        "  Branch: {} ({})",
        report.metadata.git_info.branch, report.metadata.git_info.short_sha
    );
    println!(
        "  Total: {}  Passed: {}  Changed: {}  New: {}  Deleted: {}  Failed: {}",
        summary.total,
        summary.passed,
        summary.changed,
        summary.new,
        summary.deleted,
        summary.failed
    );
    if summary.approved + summary.rejected > 0 {
        println!(
            "  Approved: {}  Rejected: {}",
            summary.approved, summary.rejected
        );
    }

    let review: Vec<&TestRecord> = report.needs_review().collect();
    if review.is_empty() {
        println!("\nNothing to review.");
    } else {
        println!("\nNeeds review ({}):", review.len());
        for test in review {
            print_record(test);
        }
    }

    if all && summary.unchanged > 0 {
        println!("\nUnchanged ({}):", summary.unchanged);
        for test in report.unchanged() {
            print_record(test);
        }
    }

    if reset {
        println!("\n  Captures for this branch were reset");
    }

    Ok(())
}

fn print_record(test: &TestRecord) {
    match &test.error {
        Some(error) => println!("  {} [{}] {}", test.name, test.display_status(), error),
        None => println!(
            "  {} [{}] {:.2}% ({} px)",
            test.name,
            test.display_status(),
            test.diff_percentage * 100.0,
            test.diff_pixels
        ),
    }
}
