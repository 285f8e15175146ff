//! Build configuration composition.
//!
//! Merge order, later wins:
//!
//! 1. built-in defaults (loaders, resolve extensions, source maps, target, outdir)
//! 2. user overrides, static or computed from the production flag
//! 3. fixed fields: entry points, `outbase`, bundling, splitting, format
//! 4. `define` table: `NODE_ENV`, preset envs, user `define`
//! 5. plugins: built-ins, then user plugins
//! 6. every preset's final hook
//!
//! Fixed fields are applied after the user merge so an override can never
//! drop or reorder the entry points.

use futures::future::BoxFuture;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::bundler::{BuildOptions, BundleFormat, Loader, Plugin};
use crate::codegen::{VIRTUAL_APP, VIRTUAL_SETUP};
use crate::config::CatalogOptions;
use crate::env::define_table;
use crate::error::{BoxError, Error, Result};
use crate::paths::output_dir;
use crate::plugins::builtin_plugins;
use crate::presets::keys;

/// Extensions tried for extensionless imports, in order.
pub const DEFAULT_RESOLVE_EXTENSIONS: &[&str] = &[".tsx", ".ts", ".jsx", ".js", ".mjs", ".json"];

/// Asset extensions emitted as files.
pub const DEFAULT_FILE_LOADER_EXTENSIONS: &[&str] = &[".png", ".jpg", ".svg", ".woff", ".woff2"];

/// User-supplied bundler options.
///
/// Every field is optional; unset fields keep the default. `entryPoints`,
/// `outbase`, `bundle`, `splitting` and `format` are accepted but always
/// replaced by the fixed values.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOverrides {
    pub entry_points: Option<Vec<String>>,
    pub outdir: Option<PathBuf>,
    pub outbase: Option<PathBuf>,
    pub bundle: Option<bool>,
    pub splitting: Option<bool>,
    pub format: Option<BundleFormat>,
    pub loader: Option<BTreeMap<String, Loader>>,
    pub resolve_extensions: Option<Vec<String>>,
    pub sourcemap: Option<bool>,
    pub target: Option<Vec<String>>,
    pub minify: Option<bool>,
    pub external: Option<Vec<String>>,
    pub define: Option<BTreeMap<String, String>>,
    /// Appended after the built-in plugins.
    #[serde(skip)]
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl std::fmt::Debug for BuildOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOverrides")
            .field("entry_points", &self.entry_points)
            .field("outdir", &self.outdir)
            .field("loader", &self.loader)
            .field("resolve_extensions", &self.resolve_extensions)
            .field("sourcemap", &self.sourcemap)
            .field("target", &self.target)
            .field("minify", &self.minify)
            .field("external", &self.external)
            .field("define", &self.define)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Computes overrides from the production flag.
pub type ComputeOverridesFn =
    Arc<dyn Fn(bool) -> BoxFuture<'static, std::result::Result<BuildOverrides, BoxError>> + Send + Sync>;

/// User bundler configuration: a static object or a function of the production flag.
#[derive(Clone)]
pub enum UserBuildConfig {
    Static(BuildOverrides),
    Computed(ComputeOverridesFn),
}

impl UserBuildConfig {
    /// Wrap an async closure.
    pub fn computed<F, Fut>(f: F) -> Self
    where
        F: Fn(bool) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = std::result::Result<BuildOverrides, BoxError>>
            + Send
            + 'static,
    {
        Self::Computed(Arc::new(
            move |is_production| -> BoxFuture<'static, std::result::Result<BuildOverrides, BoxError>> {
                Box::pin(f(is_production))
            },
        ))
    }

    /// Produce the overrides for a build.
    pub async fn resolve(&self, is_production: bool) -> Result<BuildOverrides> {
        match self {
            Self::Static(overrides) => Ok(overrides.clone()),
            Self::Computed(f) => f(is_production).await.map_err(Error::UserBuildConfig),
        }
    }
}

/// Overrides for this invocation.
///
/// Explicit `build_overrides` win; otherwise a static object is read from the
/// framework preset at `options.builder.buildConfig`.
pub async fn user_overrides(options: &CatalogOptions) -> Result<BuildOverrides> {
    if let Some(config) = &options.build_overrides {
        return config.resolve(options.config_type.is_production()).await;
    }

    let framework = options
        .presets
        .apply(keys::FRAMEWORK, serde_json::Value::Null, options)
        .await?;
    match framework.pointer("/options/builder/buildConfig") {
        Some(value) if !value.is_null() => {
            serde_json::from_value(value.clone()).map_err(|source| Error::PresetValue {
                key: keys::FRAMEWORK.to_string(),
                source,
            })
        }
        _ => Ok(BuildOverrides::default()),
    }
}

/// Built-in defaults.
#[must_use]
pub fn default_build_options(outdir: PathBuf) -> BuildOptions {
    BuildOptions {
        entry_points: Vec::new(),
        outdir,
        outbase: PathBuf::new(),
        bundle: true,
        splitting: true,
        format: BundleFormat::Esm,
        loader: DEFAULT_FILE_LOADER_EXTENSIONS
            .iter()
            .map(|ext| ((*ext).to_string(), Loader::File))
            .collect(),
        resolve_extensions: DEFAULT_RESOLVE_EXTENSIONS
            .iter()
            .map(|ext| (*ext).to_string())
            .collect(),
        sourcemap: true,
        target: vec!["esnext".to_string()],
        minify: false,
        external: Vec::new(),
        define: BTreeMap::new(),
        plugins: Vec::new(),
    }
}

fn apply_overrides(config: &mut BuildOptions, overrides: &BuildOverrides) {
    if let Some(outdir) = &overrides.outdir {
        config.outdir.clone_from(outdir);
    }
    if let Some(loader) = &overrides.loader {
        config.loader.clone_from(loader);
    }
    if let Some(exts) = &overrides.resolve_extensions {
        config.resolve_extensions.clone_from(exts);
    }
    if let Some(sourcemap) = overrides.sourcemap {
        config.sourcemap = sourcemap;
    }
    if let Some(target) = &overrides.target {
        config.target.clone_from(target);
    }
    if let Some(minify) = overrides.minify {
        config.minify = minify;
    }
    if let Some(external) = &overrides.external {
        config.external.clone_from(external);
    }
}

/// Entry points: setup, app, then stories in the given (sorted) order.
#[must_use]
pub fn entry_points(stories: &[PathBuf]) -> Vec<String> {
    let mut entries = vec![VIRTUAL_SETUP.to_string(), VIRTUAL_APP.to_string()];
    entries.extend(stories.iter().map(|s| storyforge_util::path::to_slash(s)));
    entries
}

/// Compose the bundler configuration for a story set.
pub async fn compose_build_options(
    stories: &[PathBuf],
    options: &CatalogOptions,
) -> Result<BuildOptions> {
    let envs: BTreeMap<String, String> = options
        .presets
        .apply_as(keys::ENV, serde_json::json!({}), options)
        .await?;
    let overrides = user_overrides(options).await?;

    let mut config = default_build_options(output_dir(options));
    apply_overrides(&mut config, &overrides);

    config.entry_points = entry_points(stories);
    config.outbase.clone_from(&options.working_dir);
    config.bundle = true;
    config.splitting = true;
    config.format = BundleFormat::Esm;

    config.define = define_table(
        options.config_type,
        &envs,
        &overrides.define.unwrap_or_default(),
    );

    let mut plugins = builtin_plugins(options);
    plugins.extend(overrides.plugins);
    config.plugins = plugins;

    tracing::debug!(
        entries = config.entry_points.len(),
        plugins = ?config.plugin_names(),
        outdir = %config.outdir.display(),
        "Composed build options"
    );

    options.presets.apply_build_final(config, options).await
}
