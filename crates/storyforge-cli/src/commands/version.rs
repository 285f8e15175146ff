use miette::Result;
use storyforge_core::version::{version_string, VERSION};

pub fn run(json: bool) -> Result<()> {
    if json {
        return super::print_json(&serde_json::json!({ "version": VERSION }));
    }
    println!("{}", version_string());
    Ok(())
}
