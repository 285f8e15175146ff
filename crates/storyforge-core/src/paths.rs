use std::path::{Path, PathBuf};

use crate::config::CatalogOptions;

/// Tool name used for the cache subdirectory.
pub const CACHE_NAMESPACE: &str = "storyforge";

/// Name of the bundler output directory.
pub const OUTPUT_DIR_NAME: &str = "esbuild-out";

/// Find the project root by walking up from `cwd` looking for `package.json`.
///
/// Returns the first directory containing the marker, or `None` if none is found.
#[must_use]
pub fn project_root(cwd: &Path) -> Option<PathBuf> {
    let mut current = cwd.to_path_buf();

    loop {
        if current.join("package.json").is_file() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Get the per-project cache directory for storyforge.
///
/// `<project-root>/node_modules/.cache/storyforge`, or `None` when the
/// working directory is not inside a package.
#[must_use]
pub fn cache_dir(working_dir: &Path) -> Option<PathBuf> {
    project_root(working_dir).map(|root| {
        root.join("node_modules")
            .join(".cache")
            .join(CACHE_NAMESPACE)
    })
}

/// Resolve the directory the bundler writes into.
///
/// Precedence:
/// 1. `options.output_dir` when set
/// 2. `<cache-dir>/esbuild-out`
/// 3. `<config-dir>/esbuild-out`, with a warning
#[must_use]
pub fn output_dir(options: &CatalogOptions) -> PathBuf {
    if let Some(dir) = &options.output_dir {
        return dir.clone();
    }
    output_dir_in(options, cache_dir(&options.working_dir))
}

fn output_dir_in(options: &CatalogOptions, cache: Option<PathBuf>) -> PathBuf {
    match cache {
        Some(cache) => cache.join(OUTPUT_DIR_NAME),
        None => {
            let fallback = options.config_dir.join(OUTPUT_DIR_NAME);
            tracing::warn!(
                working_dir = %options.working_dir.display(),
                fallback = %fallback.display(),
                "No cache directory available; writing build output under the config directory"
            );
            fallback
        }
    }
}
