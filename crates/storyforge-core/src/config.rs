use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compose::UserBuildConfig;
use crate::docgen::{DisabledDocgen, DocExtractor};
use crate::error::{Error, Result};
use crate::presets::{Presets, ValuePreset};

/// Name of the catalog configuration file inside the config directory.
pub const CONFIG_FILE: &str = "storyforge.json";

/// Find the configuration file in `config_dir`.
#[must_use]
pub fn find_config_file(config_dir: &Path) -> Option<PathBuf> {
    let path = config_dir.join(CONFIG_FILE);
    path.is_file().then_some(path)
}

/// Load the configuration file as a preset.
///
/// The file is a JSON object keyed by preset key (`stories`, `env`,
/// `framework`, ...). Returns `Ok(None)` when there is no file.
pub fn load_config_preset(config_dir: &Path) -> Result<Option<ValuePreset>> {
    let Some(path) = find_config_file(config_dir) else {
        return Ok(None);
    };

    let source = storyforge_util::fs::read_to_string_lossy(&path).map_err(|source| {
        Error::ConfigRead {
            path: path.clone(),
            source,
        }
    })?;
    let values: Map<String, Value> =
        serde_json::from_str(&source).map_err(|source| Error::ConfigParse {
            path: path.clone(),
            source,
        })?;

    tracing::debug!(path = %path.display(), keys = values.len(), "Loaded catalog config");
    Ok(Some(ValuePreset::new(CONFIG_FILE, values)))
}

/// Whether the catalog is being served for development or built for production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfigType {
    #[default]
    Development,
    Production,
}

impl ConfigType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "DEVELOPMENT",
            Self::Production => "PRODUCTION",
        }
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Value substituted for `process.env.NODE_ENV`.
    #[must_use]
    pub fn node_env(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Options supplied by the host catalog for one start/build invocation.
///
/// Cheap to clone: the preset pipeline, user overrides and documentation
/// extractor are shared behind `Arc`s.
#[derive(Clone)]
pub struct CatalogOptions {
    /// Absolute path of the catalog's configuration directory (e.g. `.storybook`).
    pub config_dir: PathBuf,
    /// Absolute working directory; story keys and `outbase` are relative to it.
    pub working_dir: PathBuf,
    /// Development or production.
    pub config_type: ConfigType,
    /// Ordered preset pipeline.
    pub presets: Arc<Presets>,
    /// User bundler overrides, static or computed from the production flag.
    pub build_overrides: Option<UserBuildConfig>,
    /// Component documentation extractor used by the docgen transform.
    pub doc_extractor: Arc<dyn DocExtractor>,
    /// Explicit output directory, bypassing the cache-directory convention.
    pub output_dir: Option<PathBuf>,
}

impl CatalogOptions {
    /// Create options for a config directory (relative paths resolve against `working_dir`).
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = storyforge_util::path::clean(&working_dir.into());
        let config_dir = storyforge_util::path::absolutize(&config_dir.into(), &working_dir);
        Self {
            config_dir,
            working_dir,
            config_type: ConfigType::default(),
            presets: Arc::new(Presets::default()),
            build_overrides: None,
            doc_extractor: Arc::new(DisabledDocgen),
            output_dir: None,
        }
    }

    /// Set development or production mode.
    #[must_use]
    pub fn with_config_type(mut self, config_type: ConfigType) -> Self {
        self.config_type = config_type;
        self
    }

    /// Set the preset pipeline.
    #[must_use]
    pub fn with_presets(mut self, presets: Presets) -> Self {
        self.presets = Arc::new(presets);
        self
    }

    /// Set user bundler overrides.
    #[must_use]
    pub fn with_build_overrides(mut self, overrides: UserBuildConfig) -> Self {
        self.build_overrides = Some(overrides);
        self
    }

    /// Set the documentation extractor.
    #[must_use]
    pub fn with_doc_extractor(mut self, extractor: Arc<dyn DocExtractor>) -> Self {
        self.doc_extractor = extractor;
        self
    }

    /// Set an explicit output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

impl std::fmt::Debug for CatalogOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogOptions")
            .field("config_dir", &self.config_dir)
            .field("working_dir", &self.working_dir)
            .field("config_type", &self.config_type)
            .field("presets", &self.presets.names())
            .field("build_overrides", &self.build_overrides.is_some())
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_preset_missing_file() {
        let dir = tempdir().unwrap();
        assert!(load_config_preset(dir.path()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_config_preset_reads_keys() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"stories": ["../src/**/*.stories.tsx"], "logLevel": "debug"}"#,
        )
        .unwrap();

        let preset = load_config_preset(dir.path()).unwrap().unwrap();
        let presets = Presets::new(vec![Arc::new(preset)]);
        let options = CatalogOptions::new(dir.path(), dir.path());

        let log_level = presets.apply("logLevel", Value::Null, &options).await.unwrap();
        assert_eq!(log_level, Value::from("debug"));
        let stories = presets.apply("stories", Value::Null, &options).await.unwrap();
        assert!(stories.is_array());
    }

    #[test]
    fn test_load_config_preset_rejects_non_object() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[1, 2]").unwrap();

        let err = load_config_preset(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(err.to_string().contains("storyforge.json"));
    }

    #[test]
    fn test_config_type_serde() {
        assert_eq!(
            serde_json::to_string(&ConfigType::Production).unwrap(),
            "\"PRODUCTION\""
        );
        let ct: ConfigType = serde_json::from_str("\"DEVELOPMENT\"").unwrap();
        assert_eq!(ct, ConfigType::Development);
    }

    #[test]
    fn test_node_env() {
        assert_eq!(ConfigType::Development.node_env(), "development");
        assert_eq!(ConfigType::Production.node_env(), "production");
        assert!(ConfigType::Production.is_production());
    }

    #[test]
    fn test_relative_config_dir_resolves_against_working_dir() {
        let options = CatalogOptions::new(".storybook", "/repo");
        assert_eq!(options.config_dir, Path::new("/repo/.storybook"));
        assert_eq!(options.working_dir, Path::new("/repo"));
    }

    #[test]
    fn test_absolute_config_dir_kept() {
        let options = CatalogOptions::new("/elsewhere/.storybook", "/repo");
        assert_eq!(options.config_dir, Path::new("/elsewhere/.storybook"));
    }
}
