use anyhow::Result;
use vrt_config::{PROJECT_FILE, ProjectConfig};

use crate::cli::Cli;

pub fn handle(cli: &Cli) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let vrt_toml = current_dir.join(PROJECT_FILE);

    if vrt_toml.exists() {
        anyhow::bail!("{} already exists in current directory", PROJECT_FILE);
    }

    let mut project_config = ProjectConfig::default();
    if let Some(framework) = cli.framework {
        project_config.framework = framework;
    }
    if let Some(threshold) = cli.threshold {
        project_config.diff.threshold = threshold;
    }
    project_config.validate()?;
    project_config.save(&current_dir)?;

    println!("✓ Created {}", PROJECT_FILE);
    println!("  Framework: {}", project_config.framework);
    println!(
        "  Baselines: {}",
        project_config.paths.baseline_dir.display()
    );
    println!("  Run 'vrt capture <name> <image>' to store screenshots");

    Ok(())
}
