use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;
use storyforge_core::codegen::app::story_key;
use storyforge_core::list_stories;

use super::Context;

#[derive(Debug, Serialize)]
struct StoryEntry {
    key: String,
    path: PathBuf,
}

#[derive(Debug, Serialize)]
struct StoriesReport {
    ok: bool,
    count: usize,
    stories: Vec<StoryEntry>,
}

/// List discovered stories, sorted.
pub fn run(ctx: &Context) -> Result<()> {
    let options = ctx.catalog()?;
    let stories = super::block_on(list_stories(&options))?.into_diagnostic()?;

    let report = StoriesReport {
        ok: true,
        count: stories.len(),
        stories: stories
            .into_iter()
            .map(|path| StoryEntry {
                key: story_key(&path, &options.working_dir),
                path,
            })
            .collect(),
    };

    if ctx.json {
        return super::print_json(&report);
    }

    if report.stories.is_empty() {
        println!("No stories found");
    }
    for story in &report.stories {
        println!("{}", story.key);
    }
    Ok(())
}
