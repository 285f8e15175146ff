//! Preset pipeline.
//!
//! The host catalog resolves most of its configuration by folding an initial
//! value through an ordered list of presets: each preset receives the value
//! produced by the previous one and returns the next. Keys are plain strings
//! (`stories`, `env`, `previewAnnotations`, ...) and values are JSON.
//!
//! The final build configuration is not JSON (it carries plugins), so it has
//! its own fold, [`Presets::apply_build_final`].

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::bundler::BuildOptions;
use crate::config::CatalogOptions;
use crate::error::{BoxError, Error, Result};

/// Preset keys consumed by the orchestrator.
pub mod keys {
    pub const STORIES: &str = "stories";
    pub const ENV: &str = "env";
    pub const FRAMEWORK: &str = "framework";
    pub const PREVIEW_ANNOTATIONS: &str = "previewAnnotations";
    pub const PREVIEW_HEAD: &str = "previewHead";
    pub const PREVIEW_BODY: &str = "previewBody";
    pub const LOG_LEVEL: &str = "logLevel";
    pub const CORE: &str = "core";
    pub const FEATURES: &str = "features";
    pub const DOCS: &str = "docs";
    pub const TAGS: &str = "tags";
    pub const BUILD: &str = "build";
    pub const BUILD_FINAL: &str = "esbuildFinal";
}

/// A single registered preset.
#[async_trait]
pub trait Preset: Send + Sync {
    /// Preset name for debugging and error messages.
    fn name(&self) -> &str;

    /// Transform the accumulated value for `key`.
    async fn apply(&self, _key: &str, value: Value, _options: &CatalogOptions) -> Result<Value> {
        Ok(value)
    }

    /// Transform the fully composed build configuration.
    async fn build_final(
        &self,
        config: BuildOptions,
        _options: &CatalogOptions,
    ) -> Result<BuildOptions> {
        Ok(config)
    }
}

/// Ordered preset pipeline.
#[derive(Clone, Default)]
pub struct Presets {
    presets: Vec<Arc<dyn Preset>>,
}

impl Presets {
    /// Create a pipeline from an ordered preset list.
    pub fn new(presets: Vec<Arc<dyn Preset>>) -> Self {
        Self { presets }
    }

    /// Append a preset.
    pub fn add(&mut self, preset: Arc<dyn Preset>) {
        self.presets.push(preset);
    }

    /// Preset names in order.
    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name()).collect()
    }

    /// Fold `initial` through every preset for `key`.
    pub async fn apply(
        &self,
        key: &str,
        initial: Value,
        options: &CatalogOptions,
    ) -> Result<Value> {
        let mut value = initial;
        for preset in &self.presets {
            value = preset.apply(key, value, options).await?;
        }
        Ok(value)
    }

    /// Fold and deserialize into `T`. A `null` result deserializes from `initial`'s type default.
    pub async fn apply_as<T: DeserializeOwned + Default>(
        &self,
        key: &str,
        initial: Value,
        options: &CatalogOptions,
    ) -> Result<T> {
        let value = self.apply(key, initial, options).await?;
        if value.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(value).map_err(|source| Error::PresetValue {
            key: key.to_string(),
            source,
        })
    }

    /// Pass the composed configuration through every preset's final hook.
    pub async fn apply_build_final(
        &self,
        config: BuildOptions,
        options: &CatalogOptions,
    ) -> Result<BuildOptions> {
        let mut config = config;
        for preset in &self.presets {
            config = preset.build_final(config, options).await?;
        }
        Ok(config)
    }
}

/// Merge a preset's own value into the accumulated one.
///
/// Arrays concatenate, objects shallow-merge (own keys win), anything else replaces.
fn merge_value(acc: Value, own: &Value) -> Value {
    match (acc, own) {
        (Value::Array(mut acc), Value::Array(own)) => {
            acc.extend(own.iter().cloned());
            Value::Array(acc)
        }
        (Value::Object(mut acc), Value::Object(own)) => {
            for (k, v) in own {
                acc.insert(k.clone(), v.clone());
            }
            Value::Object(acc)
        }
        (_, own) => own.clone(),
    }
}

/// A preset answering keys from a static JSON object.
#[derive(Debug, Clone)]
pub struct ValuePreset {
    name: String,
    values: Map<String, Value>,
}

impl ValuePreset {
    pub fn new(name: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[async_trait]
impl Preset for ValuePreset {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, key: &str, value: Value, _options: &CatalogOptions) -> Result<Value> {
        match self.values.get(key) {
            Some(own) => Ok(merge_value(value, own)),
            None => Ok(value),
        }
    }
}

/// Closure form of the final build-configuration hook.
pub type BuildFinalFn = Arc<
    dyn Fn(BuildOptions) -> BoxFuture<'static, std::result::Result<BuildOptions, BoxError>>
        + Send
        + Sync,
>;

/// A preset contributing only a final build-configuration hook.
pub struct BuildFinalPreset {
    name: String,
    hook: BuildFinalFn,
}

impl BuildFinalPreset {
    pub fn new(name: impl Into<String>, hook: BuildFinalFn) -> Self {
        Self {
            name: name.into(),
            hook,
        }
    }
}

#[async_trait]
impl Preset for BuildFinalPreset {
    fn name(&self) -> &str {
        &self.name
    }

    async fn build_final(
        &self,
        config: BuildOptions,
        _options: &CatalogOptions,
    ) -> Result<BuildOptions> {
        (self.hook)(config).await.map_err(|e| Error::Preset {
            preset: self.name.clone(),
            key: keys::BUILD_FINAL.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn preset(name: &str, values: Value) -> Arc<dyn Preset> {
        let Value::Object(map) = values else {
            panic!("preset values must be an object");
        };
        Arc::new(ValuePreset::new(name, map))
    }

    fn options() -> CatalogOptions {
        CatalogOptions::new("/repo/.storybook", "/repo")
    }

    #[tokio::test]
    async fn test_arrays_concatenate_in_pipeline_order() {
        let presets = Presets::new(vec![
            preset("addon", json!({"previewAnnotations": ["addon/preview"]})),
            preset("framework", json!({"previewAnnotations": ["framework/preview"]})),
        ]);

        let value = presets
            .apply(keys::PREVIEW_ANNOTATIONS, json!([]), &options())
            .await
            .unwrap();
        assert_eq!(value, json!(["addon/preview", "framework/preview"]));
    }

    #[tokio::test]
    async fn test_objects_shallow_merge_later_wins() {
        let presets = Presets::new(vec![
            preset("a", json!({"env": {"A": "1", "B": "1"}})),
            preset("b", json!({"env": {"B": "2"}})),
        ]);

        let value = presets.apply(keys::ENV, json!({}), &options()).await.unwrap();
        assert_eq!(value, json!({"A": "1", "B": "2"}));
    }

    #[tokio::test]
    async fn test_scalars_replace() {
        let presets = Presets::new(vec![
            preset("a", json!({"logLevel": "info"})),
            preset("b", json!({"logLevel": "debug"})),
        ]);
        let value = presets
            .apply(keys::LOG_LEVEL, Value::Null, &options())
            .await
            .unwrap();
        assert_eq!(value, json!("debug"));
    }

    #[tokio::test]
    async fn test_unknown_key_returns_initial() {
        let presets = Presets::new(vec![preset("a", json!({"env": {}}))]);
        let value = presets
            .apply("unknown", json!(["x"]), &options())
            .await
            .unwrap();
        assert_eq!(value, json!(["x"]));
    }

    #[tokio::test]
    async fn test_apply_as_reports_malformed_values() {
        let presets = Presets::new(vec![preset("a", json!({"env": ["not", "a", "map"]}))]);
        let result: Result<std::collections::BTreeMap<String, String>> =
            presets.apply_as(keys::ENV, json!({}), &options()).await;
        assert!(matches!(result, Err(Error::PresetValue { ref key, .. }) if key == "env"));
    }

    #[tokio::test]
    async fn test_apply_as_null_uses_default() {
        let presets = Presets::default();
        let value: Option<String> = presets
            .apply_as(keys::PREVIEW_HEAD, Value::Null, &options())
            .await
            .unwrap();
        assert!(value.is_none());
    }
}
