use miette::{IntoDiagnostic, Result};
use storyforge_core::{compose_build_options, list_stories};

use super::Context;

/// Print the bundler configuration `start`/`build` would use.
///
/// Plugins are not serializable; their names are listed separately.
pub fn run(ctx: &Context) -> Result<()> {
    let options = ctx.catalog()?;
    let config = super::block_on(async {
        let stories = list_stories(&options).await?;
        compose_build_options(&stories, &options).await
    })?
    .into_diagnostic()?;

    let mut value = serde_json::to_value(&config).into_diagnostic()?;
    if let Some(object) = value.as_object_mut() {
        object.insert("plugins".to_string(), serde_json::json!(config.plugin_names()));
    }

    if ctx.json {
        return super::print_json(&value);
    }

    println!("Entry points:");
    for entry in &config.entry_points {
        println!("  {entry}");
    }
    println!("Output:  {}", config.outdir.display());
    println!("Plugins: {}", config.plugin_names().join(", "));
    println!("Define:");
    for (key, val) in &config.define {
        println!("  {key} = {val}");
    }
    Ok(())
}
