//! In-memory bundler used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storyforge_core::bundler::{
    BuildContext, BuildOptions, BuildOutput, BundleError, Bundler, LoadArgs, PluginContainer,
    PluginError, ResolveArgs, ServeOptions, ServeResult,
};
use storyforge_core::{CatalogOptions, Presets, ValuePreset};

pub const FAKE_PORT: u16 = 41234;

#[derive(Default)]
pub struct FakeBundler {
    pub contexts_created: AtomicUsize,
    pub disposed: AtomicUsize,
    pub builds: AtomicUsize,
    pub last_config: Mutex<Option<BuildOptions>>,
    pub last_serve: Mutex<Option<ServeOptions>>,
    pub fail_serve: bool,
    pub fail_dispose: bool,
    pub context_delay: Option<Duration>,
    pub build_errors: Vec<String>,
    /// Entry point to module contents, as loaded through the plugin chain.
    pub modules: Mutex<BTreeMap<String, String>>,
}

impl FakeBundler {
    pub fn contexts(&self) -> usize {
        self.contexts_created.load(Ordering::SeqCst)
    }

    pub fn disposals(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> BuildOptions {
        self.last_config
            .lock()
            .unwrap()
            .clone()
            .expect("bundler received no config")
    }

    pub fn module(&self, entry: &str) -> String {
        self.modules
            .lock()
            .unwrap()
            .get(entry)
            .cloned()
            .unwrap_or_else(|| panic!("no module loaded for {entry}"))
    }
}

fn plugin_failed(e: PluginError) -> BundleError {
    BundleError::new("PLUGIN_FAILED", e.to_string())
}

/// Resolve and load every entry point through the plugins, the way a bundler
/// walks its entries: first resolver wins, then first loader wins, falling
/// back to the file on disk.
async fn load_entries(
    plugins: &PluginContainer,
    entry_points: &[String],
) -> Result<BTreeMap<String, String>, BundleError> {
    let mut modules = BTreeMap::new();
    for entry in entry_points {
        let args = match plugins
            .resolve(&ResolveArgs::entry(entry.as_str()))
            .await
            .map_err(plugin_failed)?
        {
            Some(resolved) => LoadArgs {
                path: resolved.path,
                namespace: resolved.namespace,
            },
            None => LoadArgs::file(entry.as_str()),
        };
        let contents = match plugins.load(&args).await.map_err(plugin_failed)? {
            Some(loaded) => loaded.contents,
            None => tokio::fs::read_to_string(&args.path)
                .await
                .map_err(|e| BundleError::new("LOAD_FAILED", e.to_string()))?,
        };
        modules.insert(entry.clone(), contents);
    }
    Ok(modules)
}

pub struct FakeContext {
    bundler: Arc<FakeBundler>,
    plugins: PluginContainer,
    entry_points: Vec<String>,
}

#[async_trait]
impl BuildContext for FakeContext {
    async fn rebuild(&self) -> Result<BuildOutput, BundleError> {
        Ok(BuildOutput::default())
    }

    async fn serve(&self, options: ServeOptions) -> Result<ServeResult, BundleError> {
        if self.bundler.fail_serve {
            return Err(BundleError::new("SERVE_FAILED", "address in use"));
        }
        *self.bundler.last_serve.lock().unwrap() = Some(options);
        let modules = load_entries(&self.plugins, &self.entry_points).await?;
        *self.bundler.modules.lock().unwrap() = modules;
        Ok(ServeResult {
            host: "127.0.0.1".to_string(),
            port: FAKE_PORT,
        })
    }

    async fn dispose(&self) -> Result<(), BundleError> {
        self.bundler.disposed.fetch_add(1, Ordering::SeqCst);
        if self.bundler.fail_dispose {
            return Err(BundleError::new("DISPOSE_FAILED", "already closed"));
        }
        Ok(())
    }
}

/// Handle implementing [`Bundler`] over a shared [`FakeBundler`].
#[derive(Clone)]
pub struct SharedBundler(pub Arc<FakeBundler>);

#[async_trait]
impl Bundler for SharedBundler {
    async fn context(&self, options: BuildOptions) -> Result<Box<dyn BuildContext>, BundleError> {
        if let Some(delay) = self.0.context_delay {
            tokio::time::sleep(delay).await;
        }
        self.0.contexts_created.fetch_add(1, Ordering::SeqCst);
        let plugins = PluginContainer::new(options.plugins.clone());
        let entry_points = options.entry_points.clone();
        *self.0.last_config.lock().unwrap() = Some(options);
        Ok(Box::new(FakeContext {
            bundler: self.0.clone(),
            plugins,
            entry_points,
        }))
    }

    async fn build(&self, options: BuildOptions) -> Result<BuildOutput, BundleError> {
        self.0.builds.fetch_add(1, Ordering::SeqCst);
        let plugins = PluginContainer::new(options.plugins.clone());
        let modules = load_entries(&plugins, &options.entry_points).await?;
        *self.0.modules.lock().unwrap() = modules;
        *self.0.last_config.lock().unwrap() = Some(options);
        Ok(BuildOutput {
            errors: self.0.build_errors.clone(),
            ..BuildOutput::default()
        })
    }
}

/// Lay out a catalog with a config dir and the given story files.
pub fn catalog(root: &Path, stories: &[&str], values: serde_json::Value) -> CatalogOptions {
    let config_dir = root.join(".storybook");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("preview.ts"), "export default {};").unwrap();
    for story in stories {
        let path = root.join(story);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "export default {};\nexport const Primary = {};\n").unwrap();
    }

    let serde_json::Value::Object(map) = values else {
        panic!("preset values must be an object");
    };
    CatalogOptions::new(config_dir, root)
        .with_output_dir(root.join("out"))
        .with_presets(Presets::new(vec![Arc::new(ValuePreset::new("main", map))]))
}
