use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use vrt_config::{ProjectConfig, UserConfig};
use vrt_engine::{Engine, EngineSettings};

use crate::cli::Cli;

/// Project configuration with command-line overrides applied
pub struct Context {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub branch: Option<String>,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let (root, mut config) = match &cli.config {
            Some(path) => {
                let config = ProjectConfig::load_file(path)?;
                (project_root_of(path)?, config)
            }
            None => match ProjectConfig::find_and_load()? {
                Some(found) => found,
                None => {
                    let root = std::env::current_dir()?;
                    debug!("No vrt.toml found, using defaults in {}", root.display());
                    (root, ProjectConfig::default())
                }
            },
        };

        if let Some(framework) = cli.framework {
            config.framework = framework;
        }
        if let Some(threshold) = cli.threshold {
            config.diff.threshold = threshold;
        }
        config.validate()?;

        Ok(Self {
            root,
            config,
            branch: cli.branch.clone(),
        })
    }

    pub fn engine(&self) -> Result<Engine> {
        let user = UserConfig::load().context("Failed to load user config")?;
        let mut settings = EngineSettings::from_config(&self.config, &self.root).with_user(&user);
        settings.branch = self.branch.clone();
        Ok(Engine::open(settings, &self.root))
    }
}

fn project_root_of(config_path: &Path) -> Result<PathBuf> {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}
