use miette::{IntoDiagnostic, Result};
use storyforge_core::dev::generate_iframe_html;

use super::Context;

pub fn run(ctx: &Context, server_url: &str) -> Result<()> {
    let options = ctx.catalog()?;
    let html = super::block_on(generate_iframe_html(&options, server_url))?.into_diagnostic()?;

    if ctx.json {
        return super::print_json(&serde_json::json!({ "html": html }));
    }
    print!("{html}");
    Ok(())
}
