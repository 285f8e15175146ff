//! Entry module generation.
//!
//! Two virtual modules are synthesized for every build:
//!
//! - `virtualSetup.js` initializes the preview runtime
//! - `virtualApp.js` imports the preview annotations, composes them and
//!   hands a lazy story importer to the preview engine
//!
//! Generation itself is pure: [`app::generate_app_code`] maps an
//! [`AppEntryInput`] to text. [`app_entry_input`] does the I/O (preset
//! lookups and finding the preview file) needed to build that input.

pub mod app;
pub mod setup;

pub use app::generate_app_code;
pub use setup::generate_setup_code;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storyforge_util::path::to_slash;

use crate::config::CatalogOptions;
use crate::error::Result;
use crate::presets::keys;

/// Entry point name of the setup module.
pub const VIRTUAL_SETUP: &str = "virtualSetup.js";

/// Entry point name of the app module.
pub const VIRTUAL_APP: &str = "virtualApp.js";

/// File stems tried in the config directory for the project's preview file.
pub const PREVIEW_FILE_STEMS: &[&str] = &["preview", "config"];

/// Extensions tried for the project's preview file, in order.
pub const PREVIEW_FILE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Encode a value as a JavaScript string literal.
#[must_use]
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// A project-level annotation module imported before any story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreviewAnnotation {
    /// A bare module specifier (`@storybook/addon-docs/preview`).
    Specifier(String),
    /// A resolved file.
    Object { absolute: PathBuf },
}

impl PreviewAnnotation {
    /// The specifier to import.
    #[must_use]
    pub fn import_path(&self) -> String {
        match self {
            Self::Specifier(s) => s.clone(),
            Self::Object { absolute } => to_slash(absolute),
        }
    }
}

/// Everything the app module depends on.
#[derive(Debug, Clone, Default)]
pub struct AppEntryInput {
    /// Annotations in pipeline order, project preview file last.
    pub annotations: Vec<PreviewAnnotation>,
    /// Absolute story paths, sorted.
    pub stories: Vec<PathBuf>,
    /// Base of story keys.
    pub working_dir: PathBuf,
}

/// Locate the project's own preview (or legacy config) file.
#[must_use]
pub fn find_preview_file(config_dir: &Path) -> Option<PathBuf> {
    storyforge_util::fs::find_first_with_extensions(
        config_dir,
        PREVIEW_FILE_STEMS,
        PREVIEW_FILE_EXTENSIONS,
    )
}

/// Collect preview annotations: preset values in order, then the project file.
pub async fn preview_annotations(options: &CatalogOptions) -> Result<Vec<PreviewAnnotation>> {
    let mut annotations: Vec<PreviewAnnotation> = options
        .presets
        .apply_as(keys::PREVIEW_ANNOTATIONS, serde_json::json!([]), options)
        .await?;

    if let Some(file) = find_preview_file(&options.config_dir) {
        annotations.push(PreviewAnnotation::Object { absolute: file });
    }

    Ok(annotations)
}

/// Gather the app module input for a story set.
pub async fn app_entry_input(
    options: &CatalogOptions,
    stories: Vec<PathBuf>,
) -> Result<AppEntryInput> {
    Ok(AppEntryInput {
        annotations: preview_annotations(options).await?,
        stories,
        working_dir: options.working_dir.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{Presets, ValuePreset};
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_annotation_deserializes_both_forms() {
        let annotations: Vec<PreviewAnnotation> = serde_json::from_value(serde_json::json!([
            "@storybook/addon-docs/preview",
            {"bare": "x", "absolute": "/repo/node_modules/x/preview.js"}
        ]))
        .unwrap();
        assert_eq!(
            annotations[0],
            PreviewAnnotation::Specifier("@storybook/addon-docs/preview".to_string())
        );
        assert_eq!(
            annotations[1].import_path(),
            "/repo/node_modules/x/preview.js"
        );
    }

    #[test]
    fn test_find_preview_file_prefers_preview_over_config() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.js"), "").unwrap();
        fs::write(dir.path().join("preview.tsx"), "").unwrap();
        assert_eq!(find_preview_file(dir.path()), Some(dir.path().join("preview.tsx")));
    }

    #[tokio::test]
    async fn test_preview_file_appended_after_presets() {
        let dir = tempdir().unwrap();
        let config_dir = dir.path().join(".storybook");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("preview.ts"), "export default {};").unwrap();

        let serde_json::Value::Object(values) = serde_json::json!({
            "previewAnnotations": ["addon-a/preview", "addon-b/preview"]
        }) else {
            unreachable!()
        };
        let options = CatalogOptions::new(&config_dir, dir.path())
            .with_presets(Presets::new(vec![Arc::new(ValuePreset::new("main", values))]));

        let annotations = preview_annotations(&options).await.unwrap();
        let paths: Vec<String> = annotations.iter().map(PreviewAnnotation::import_path).collect();
        assert_eq!(
            paths,
            vec![
                "addon-a/preview".to_string(),
                "addon-b/preview".to_string(),
                to_slash(&config_dir.join("preview.ts")),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_preview_file() {
        let dir = tempdir().unwrap();
        let options = CatalogOptions::new(".storybook", dir.path());
        assert!(preview_annotations(&options).await.unwrap().is_empty());
    }
}
