//! Plugin interface for the bundler.
//!
//! Mirrors the on-resolve / on-load interception model of the bundler: a
//! plugin may claim a module specifier during resolution (optionally moving
//! it into its own namespace) and may supply the contents of a module during
//! loading. Returning `Ok(None)` from either hook declines, letting the next
//! plugin or the bundler's default behavior handle the request.
//!
//! ## Example
//!
//! ```ignore
//! use storyforge_core::bundler::{Plugin, LoadArgs, LoadResult, HookResult};
//!
//! struct TxtPlugin;
//!
//! #[async_trait::async_trait]
//! impl Plugin for TxtPlugin {
//!     fn name(&self) -> &str { "txt" }
//!
//!     async fn load(&self, args: &LoadArgs) -> HookResult<Option<LoadResult>> {
//!         if args.path.ends_with(".txt") {
//!             let text = std::fs::read_to_string(&args.path).unwrap_or_default();
//!             return Ok(Some(LoadResult::js(format!("export default {text:?};"))));
//!         }
//!         Ok(None)
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use super::Loader;

/// Namespace of modules read from disk.
pub const FILE_NAMESPACE: &str = "file";

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl PluginError {
    pub fn new(plugin: impl Into<String>, hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

/// Arguments of a resolve request.
#[derive(Debug, Clone)]
pub struct ResolveArgs {
    /// The import specifier as written.
    pub path: String,
    /// The importing module, if any (entry points have none).
    pub importer: Option<String>,
    /// Namespace of the importer.
    pub namespace: String,
    /// Directory relative imports resolve against.
    pub resolve_dir: Option<PathBuf>,
}

impl ResolveArgs {
    /// Resolve request for an entry point.
    pub fn entry(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            importer: None,
            namespace: FILE_NAMESPACE.to_string(),
            resolve_dir: None,
        }
    }
}

/// Result of resolve hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    /// Resolved module path (a file path in the `file` namespace).
    pub path: String,
    /// Namespace the module now lives in.
    pub namespace: String,
    /// Whether this module is external (don't bundle).
    pub external: bool,
}

impl ResolveResult {
    /// Resolve into a plugin-owned namespace.
    pub fn in_namespace(path: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
            external: false,
        }
    }
}

/// Arguments of a load request.
#[derive(Debug, Clone)]
pub struct LoadArgs {
    /// Resolved module path.
    pub path: String,
    /// Namespace the module was resolved into.
    pub namespace: String,
}

impl LoadArgs {
    /// Load request for a file on disk.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: FILE_NAMESPACE.to_string(),
        }
    }
}

/// Result of load hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    /// Module source code.
    pub contents: String,
    /// Loader for the contents (bundler infers from the path when `None`).
    pub loader: Option<Loader>,
    /// Directory that relative imports inside `contents` resolve against.
    pub resolve_dir: Option<PathBuf>,
}

impl LoadResult {
    /// Plain JavaScript contents.
    pub fn js(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            loader: Some(Loader::Js),
            resolve_dir: None,
        }
    }
}

/// The main plugin trait.
///
/// Both hooks have default implementations that decline, so you only need
/// to implement the hooks you care about. Hooks are async because plugins may
/// consult the preset pipeline or the filesystem while answering.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Resolve a module specifier.
    ///
    /// Return `Some(result)` to handle this resolution, or `None` to let
    /// the next plugin or default resolver handle it.
    async fn resolve(&self, _args: &ResolveArgs) -> HookResult<Option<ResolveResult>> {
        Ok(None)
    }

    /// Load a module.
    ///
    /// Return `Some(result)` to provide the module source, or `None` to let
    /// the next plugin or default loader handle it.
    async fn load(&self, _args: &LoadArgs) -> HookResult<Option<LoadResult>> {
        Ok(None)
    }
}

/// Dispatches resolve/load requests across an ordered plugin list.
///
/// The first plugin that returns `Some` wins; order is registration order.
#[derive(Clone, Default)]
pub struct PluginContainer {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginContainer {
    /// Create a container from an ordered plugin list.
    pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    /// Add a plugin after the existing ones.
    pub fn add(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Check if any plugins are registered.
    pub fn has_plugins(&self) -> bool {
        !self.plugins.is_empty()
    }

    /// Try to resolve a module through plugins.
    /// Returns None if no plugin handled the resolution.
    pub async fn resolve(&self, args: &ResolveArgs) -> HookResult<Option<ResolveResult>> {
        for plugin in &self.plugins {
            if let Some(result) = plugin.resolve(args).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Try to load a module through plugins.
    /// Returns None if no plugin handled the load.
    pub async fn load(&self, args: &LoadArgs) -> HookResult<Option<LoadResult>> {
        for plugin in &self.plugins {
            if let Some(result) = plugin.load(args).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Claim(&'static str, &'static str);

    #[async_trait]
    impl Plugin for Claim {
        fn name(&self) -> &str {
            self.0
        }

        async fn resolve(&self, args: &ResolveArgs) -> HookResult<Option<ResolveResult>> {
            if args.path == self.1 {
                return Ok(Some(ResolveResult::in_namespace(&args.path, self.0)));
            }
            Ok(None)
        }

        async fn load(&self, args: &LoadArgs) -> HookResult<Option<LoadResult>> {
            if args.namespace == self.0 {
                return Ok(Some(LoadResult::js(format!("// from {}", self.0))));
            }
            Ok(None)
        }
    }

    struct Failing;

    #[async_trait]
    impl Plugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn load(&self, _args: &LoadArgs) -> HookResult<Option<LoadResult>> {
            Err(PluginError::new("failing", "load", "boom"))
        }
    }

    #[tokio::test]
    async fn test_first_plugin_wins() {
        let container = PluginContainer::new(vec![
            Arc::new(Claim("first", "shared")),
            Arc::new(Claim("second", "shared")),
        ]);

        let resolved = container
            .resolve(&ResolveArgs::entry("shared"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.namespace, "first");
    }

    #[tokio::test]
    async fn test_unclaimed_resolve_returns_none() {
        let container = PluginContainer::new(vec![Arc::new(Claim("a", "x"))]);
        assert!(container
            .resolve(&ResolveArgs::entry("y"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_load_dispatches_by_namespace() {
        let container = PluginContainer::new(vec![
            Arc::new(Claim("a", "x")),
            Arc::new(Claim("b", "y")),
        ]);
        let loaded = container
            .load(&LoadArgs {
                path: "y".to_string(),
                namespace: "b".to_string(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.contents, "// from b");
    }

    #[tokio::test]
    async fn test_plugin_error_propagates() {
        let container = PluginContainer::new(vec![Arc::new(Failing)]);
        let err = container.load(&LoadArgs::file("/a.js")).await.unwrap_err();
        assert_eq!(err.to_string(), "[failing] load: boom");
    }

    #[test]
    fn test_empty_container() {
        assert!(!PluginContainer::default().has_plugins());
    }
}
