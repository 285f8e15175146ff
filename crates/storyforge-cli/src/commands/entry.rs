use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};
use storyforge_core::codegen::{
    app_entry_input, generate_app_code, generate_setup_code, VIRTUAL_APP, VIRTUAL_SETUP,
};
use storyforge_core::list_stories;

use super::Context;

/// Generated entry module to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntryModule {
    Setup,
    App,
}

impl EntryModule {
    fn file_name(self) -> &'static str {
        match self {
            Self::Setup => VIRTUAL_SETUP,
            Self::App => VIRTUAL_APP,
        }
    }
}

pub fn run(ctx: &Context, module: EntryModule) -> Result<()> {
    let code = match module {
        EntryModule::Setup => generate_setup_code(),
        EntryModule::App => {
            let options = ctx.catalog()?;
            let input = super::block_on(async {
                let stories = list_stories(&options).await?;
                app_entry_input(&options, stories).await
            })?
            .into_diagnostic()?;
            generate_app_code(&input)
        }
    };

    if ctx.json {
        return super::print_json(&serde_json::json!({
            "module": module.file_name(),
            "code": code,
        }));
    }
    print!("{code}");
    Ok(())
}
