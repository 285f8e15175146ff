pub mod config;
pub mod entry;
pub mod iframe;
pub mod stories;
pub mod version;

use miette::{IntoDiagnostic, Result};
use std::future::Future;
use std::path::PathBuf;
use storyforge_core::config::load_config_preset;
use storyforge_core::{CatalogOptions, ConfigType, Presets};

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub cwd: PathBuf,
    pub config_dir: PathBuf,
    pub production: bool,
    pub json: bool,
}

impl Context {
    /// Build catalog options from the config directory's `storyforge.json`.
    pub fn catalog(&self) -> Result<CatalogOptions> {
        let config_type = if self.production {
            ConfigType::Production
        } else {
            ConfigType::Development
        };
        let options =
            CatalogOptions::new(&self.config_dir, &self.cwd).with_config_type(config_type);

        let mut presets = Presets::default();
        match load_config_preset(&options.config_dir).into_diagnostic()? {
            Some(preset) => presets.add(std::sync::Arc::new(preset)),
            None => tracing::warn!(
                config_dir = %options.config_dir.display(),
                "No storyforge.json found; using an empty catalog"
            ),
        }
        Ok(options.with_presets(presets))
    }
}

/// Run a future to completion on a fresh runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    Ok(runtime.block_on(future))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
