use async_trait::async_trait;

use crate::bundler::{
    HookResult, LoadArgs, LoadResult, Plugin, PluginError, ResolveArgs, ResolveResult,
};
use crate::codegen::{
    app_entry_input, generate_app_code, generate_setup_code, VIRTUAL_APP, VIRTUAL_SETUP,
};
use crate::config::CatalogOptions;
use crate::stories::list_stories;

/// Namespace holding the generated entry modules.
pub const VIRTUAL_NAMESPACE: &str = "virtual";

/// Serves the generated setup and app entry modules.
///
/// The app module is regenerated on every load so stories added while the
/// dev server runs are picked up by the next rebuild.
pub struct VirtualModulesPlugin {
    options: CatalogOptions,
}

impl VirtualModulesPlugin {
    pub fn new(options: CatalogOptions) -> Self {
        Self { options }
    }

    fn error(message: impl Into<String>) -> PluginError {
        PluginError::new("virtual-modules", "load", message)
    }

    async fn app_code(&self) -> HookResult<String> {
        let stories = list_stories(&self.options)
            .await
            .map_err(|e| Self::error(e.to_string()))?;
        let input = app_entry_input(&self.options, stories)
            .await
            .map_err(|e| Self::error(e.to_string()))?;
        Ok(generate_app_code(&input))
    }
}

#[async_trait]
impl Plugin for VirtualModulesPlugin {
    fn name(&self) -> &str {
        "virtual-modules"
    }

    async fn resolve(&self, args: &ResolveArgs) -> HookResult<Option<ResolveResult>> {
        if args.path == VIRTUAL_SETUP || args.path == VIRTUAL_APP {
            return Ok(Some(ResolveResult::in_namespace(
                &args.path,
                VIRTUAL_NAMESPACE,
            )));
        }
        Ok(None)
    }

    async fn load(&self, args: &LoadArgs) -> HookResult<Option<LoadResult>> {
        if args.namespace != VIRTUAL_NAMESPACE {
            return Ok(None);
        }

        let contents = match args.path.as_str() {
            VIRTUAL_SETUP => generate_setup_code(),
            VIRTUAL_APP => self.app_code().await?,
            other => {
                return Err(Self::error(format!("virtual module not found: {other}")));
            }
        };

        Ok(Some(LoadResult {
            resolve_dir: Some(self.options.config_dir.clone()),
            ..LoadResult::js(contents)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::FILE_NAMESPACE;
    use crate::presets::{Presets, ValuePreset};
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn virtual_load(path: &str) -> LoadArgs {
        LoadArgs {
            path: path.to_string(),
            namespace: VIRTUAL_NAMESPACE.to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolves_reserved_names_only() {
        let plugin = VirtualModulesPlugin::new(CatalogOptions::new("/repo/.storybook", "/repo"));

        for name in [VIRTUAL_SETUP, VIRTUAL_APP] {
            let resolved = plugin
                .resolve(&ResolveArgs::entry(name))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(resolved.namespace, VIRTUAL_NAMESPACE);
        }
        assert!(plugin
            .resolve(&ResolveArgs::entry("virtualOther.js"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_setup_load_resolves_in_config_dir() {
        let plugin = VirtualModulesPlugin::new(CatalogOptions::new("/repo/.storybook", "/repo"));
        let loaded = plugin.load(&virtual_load(VIRTUAL_SETUP)).await.unwrap().unwrap();
        assert_eq!(loaded.contents, generate_setup_code());
        assert_eq!(
            loaded.resolve_dir.as_deref(),
            Some(std::path::Path::new("/repo/.storybook"))
        );
    }

    #[tokio::test]
    async fn test_app_load_lists_current_stories() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("stories")).unwrap();
        fs::write(root.join("stories").join("a.stories.tsx"), "").unwrap();

        let serde_json::Value::Object(values) = serde_json::json!({
            "stories": ["../stories/*.stories.tsx"]
        }) else {
            unreachable!()
        };
        let options = CatalogOptions::new(".storybook", root)
            .with_presets(Presets::new(vec![Arc::new(ValuePreset::new("main", values))]));
        let plugin = VirtualModulesPlugin::new(options);

        let loaded = plugin.load(&virtual_load(VIRTUAL_APP)).await.unwrap().unwrap();
        assert!(loaded.contents.contains("\"./stories/a.stories.tsx\""));

        fs::write(root.join("stories").join("b.stories.tsx"), "").unwrap();
        let reloaded = plugin.load(&virtual_load(VIRTUAL_APP)).await.unwrap().unwrap();
        assert!(reloaded.contents.contains("\"./stories/b.stories.tsx\""));
    }

    #[tokio::test]
    async fn test_unknown_virtual_path_is_not_found() {
        let plugin = VirtualModulesPlugin::new(CatalogOptions::new("/repo/.storybook", "/repo"));
        let err = plugin.load(&virtual_load("virtualOther.js")).await.unwrap_err();
        assert!(err.message.contains("virtual module not found"));
    }

    #[tokio::test]
    async fn test_ignores_file_namespace() {
        let plugin = VirtualModulesPlugin::new(CatalogOptions::new("/repo/.storybook", "/repo"));
        let args = LoadArgs {
            path: VIRTUAL_APP.to_string(),
            namespace: FILE_NAMESPACE.to_string(),
        };
        assert!(plugin.load(&args).await.unwrap().is_none());
    }
}
