#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "storyforge")]
#[command(author, version, about = "Inspect a component catalog's dev build", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Catalog configuration directory, relative to the working directory
    #[arg(long, global = true, value_name = "PATH", default_value = ".storybook")]
    config_dir: PathBuf,

    /// Compose for a production build instead of development
    #[arg(long, global = true)]
    production: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// List discovered story files
    Stories,

    /// Print a generated entry module
    Entry {
        /// Which module to print
        #[arg(value_enum, default_value_t = commands::entry::EntryModule::App)]
        module: commands::entry::EntryModule,
    },

    /// Print the composed bundler configuration
    Config,

    /// Render the preview document
    Iframe {
        /// Base URL of the bundler's asset server
        #[arg(long, default_value = "http://localhost:6006")]
        server_url: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json);

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);

    let ctx = commands::Context {
        cwd,
        config_dir: cli.config_dir,
        production: cli.production,
        json: cli.json,
    };

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(ctx.json),
        Some(Commands::Stories) => {
            let span = tracing::info_span!("stories", cwd = %ctx.cwd.display());
            let _guard = span.enter();
            commands::stories::run(&ctx)
        }
        Some(Commands::Entry { module }) => commands::entry::run(&ctx, module),
        Some(Commands::Config) => commands::config::run(&ctx),
        Some(Commands::Iframe { server_url }) => commands::iframe::run(&ctx, &server_url),
    }
}
