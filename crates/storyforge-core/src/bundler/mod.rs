//! Bundler seam.
//!
//! The orchestrator never transpiles or bundles anything itself. It composes a
//! [`BuildOptions`] value and hands it to a [`Bundler`] implementation, which
//! returns either a one-shot build result or a long-lived [`BuildContext`]
//! supporting incremental rebuilds and an internal asset server.
//!
//! ## Lifecycle
//!
//! ```text
//! Bundler::context(options) → BuildContext
//!   → serve(ServeOptions { port: 0, cors_origin: "*" }) → ServeResult { port }
//!   → rebuild() ... (driven by the bundler's own watcher)
//!   → dispose()
//! ```

mod plugin;

pub use plugin::{
    HookResult, LoadArgs, LoadResult, Plugin, PluginContainer, PluginError, ResolveArgs,
    ResolveResult, FILE_NAMESPACE,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How the bundler should interpret a module's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Json,
    Css,
    Text,
    File,
    Dataurl,
    Binary,
    Empty,
}

impl Loader {
    /// Pick a script loader from a file path's extension.
    ///
    /// Only script extensions are recognised; anything else returns `None`
    /// and is left to the bundler's own loader table.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsx") => Some(Self::Jsx),
            Some("js" | "mjs") => Some(Self::Js),
            Some("tsx") => Some(Self::Tsx),
            Some("ts") => Some(Self::Ts),
            _ => None,
        }
    }
}

/// Output module format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    #[default]
    Esm,
    Cjs,
    Iife,
}

/// The full set of options handed to the bundler.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    /// Entry points: the two virtual modules first, then stories in sorted order.
    pub entry_points: Vec<String>,
    /// Output directory.
    pub outdir: PathBuf,
    /// Base directory used to compute output paths.
    pub outbase: PathBuf,
    /// Bundle dependencies into the output.
    pub bundle: bool,
    /// Split shared code into chunks.
    pub splitting: bool,
    /// Output module format.
    pub format: BundleFormat,
    /// Loader by file extension (e.g. `.png` → `file`).
    pub loader: BTreeMap<String, Loader>,
    /// Extensions tried when resolving extensionless imports.
    pub resolve_extensions: Vec<String>,
    /// Emit source maps.
    pub sourcemap: bool,
    /// Output targets (e.g. `esnext`).
    pub target: Vec<String>,
    /// Minify output.
    pub minify: bool,
    /// Modules left as imports.
    pub external: Vec<String>,
    /// Global identifier substitutions (`process.env.NODE_ENV` → `"development"`).
    pub define: BTreeMap<String, String>,
    /// Plugins, in the order the bundler must run them.
    #[serde(skip)]
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl BuildOptions {
    /// Names of the registered plugins, in order.
    #[must_use]
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }
}

// Manual Debug impl because dyn Plugin doesn't implement Debug
impl std::fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOptions")
            .field("entry_points", &self.entry_points)
            .field("outdir", &self.outdir)
            .field("outbase", &self.outbase)
            .field("bundle", &self.bundle)
            .field("splitting", &self.splitting)
            .field("format", &self.format)
            .field("loader", &self.loader)
            .field("resolve_extensions", &self.resolve_extensions)
            .field("sourcemap", &self.sourcemap)
            .field("target", &self.target)
            .field("minify", &self.minify)
            .field("external", &self.external)
            .field("define", &self.define)
            .field("plugins", &self.plugin_names())
            .finish()
    }
}

/// Options for the bundler's internal asset server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeOptions {
    /// Directory served alongside the build output.
    pub servedir: Option<PathBuf>,
    /// Host to bind (bundler default when `None`).
    pub host: Option<String>,
    /// Port to bind; `0` picks an ephemeral port.
    pub port: u16,
    /// Value for `Access-Control-Allow-Origin`.
    pub cors_origin: Option<String>,
}

/// Address the internal asset server actually bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeResult {
    pub host: String,
    pub port: u16,
}

impl ServeResult {
    /// Base URL for browser access.
    #[must_use]
    pub fn url(&self) -> String {
        let host = match self.host.as_str() {
            "" | "0.0.0.0" | "127.0.0.1" | "::" | "::1" => "localhost",
            other => other,
        };
        format!("http://{host}:{}", self.port)
    }
}

/// Result of a build or rebuild.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildOutput {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub output_files: Vec<PathBuf>,
}

/// Bundler error.
#[derive(Debug)]
pub struct BundleError {
    pub code: &'static str,
    pub message: String,
    pub path: Option<String>,
}

impl BundleError {
    /// Create an error without a path.
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }
}

impl std::fmt::Display for BundleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: {} ({})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for BundleError {}

/// A long-lived incremental build handle.
#[async_trait]
pub trait BuildContext: Send + Sync {
    /// Rebuild incrementally.
    async fn rebuild(&self) -> Result<BuildOutput, BundleError>;

    /// Start the internal asset server (also enables watch-driven rebuilds).
    async fn serve(&self, options: ServeOptions) -> Result<ServeResult, BundleError>;

    /// Release the context. In-flight rebuilds are drained or aborted by the bundler.
    async fn dispose(&self) -> Result<(), BundleError>;
}

/// The external incremental bundler.
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Create an incremental build context.
    async fn context(&self, options: BuildOptions) -> Result<Box<dyn BuildContext>, BundleError>;

    /// Run a one-shot, non-incremental build.
    async fn build(&self, options: BuildOptions) -> Result<BuildOutput, BundleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_from_path() {
        assert_eq!(Loader::from_path(Path::new("Button.jsx")), Some(Loader::Jsx));
        assert_eq!(Loader::from_path(Path::new("Button.js")), Some(Loader::Js));
        assert_eq!(Loader::from_path(Path::new("Button.mjs")), Some(Loader::Js));
        assert_eq!(Loader::from_path(Path::new("Button.tsx")), Some(Loader::Tsx));
        assert_eq!(Loader::from_path(Path::new("Button.ts")), Some(Loader::Ts));
        assert_eq!(Loader::from_path(Path::new("Button.css")), None);
    }

    #[test]
    fn test_loader_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Loader::File).unwrap(), "\"file\"");
        let loader: Loader = serde_json::from_str("\"tsx\"").unwrap();
        assert_eq!(loader, Loader::Tsx);
    }

    #[test]
    fn test_serve_result_url() {
        let served = ServeResult {
            host: "0.0.0.0".to_string(),
            port: 41234,
        };
        assert_eq!(served.url(), "http://localhost:41234");

        let served = ServeResult {
            host: "192.168.1.4".to_string(),
            port: 8000,
        };
        assert_eq!(served.url(), "http://192.168.1.4:8000");
    }

    #[test]
    fn test_bundle_error_display() {
        let err = BundleError {
            code: "BUNDLE_RESOLVE_ERROR",
            message: "Could not resolve".to_string(),
            path: Some("virtualApp.js".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "BUNDLE_RESOLVE_ERROR: Could not resolve (virtualApp.js)"
        );
    }
}
