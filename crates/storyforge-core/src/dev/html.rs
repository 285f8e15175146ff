//! Preview document (`iframe.html`) rendering.

use serde_json::{json, Value};

use crate::codegen::{VIRTUAL_APP, VIRTUAL_SETUP};
use crate::config::{CatalogOptions, ConfigType};
use crate::error::Result;
use crate::presets::keys;
use crate::stories::{story_rules, StoryDescriptor};

/// Delay before subscribing to change events; the bundler emits one on connect.
pub const LIVE_RELOAD_GRACE_MS: u64 = 1000;

/// Everything rendered into the preview document.
#[derive(Debug, Clone)]
pub struct PreviewDocument {
    pub config_type: ConfigType,
    pub log_level: String,
    pub framework_options: Value,
    pub channel_options: Value,
    pub features: Value,
    pub stories: Vec<StoryDescriptor>,
    pub docs_options: Value,
    pub tags_options: Value,
    /// Publish the empty-blocks module used by test runs.
    pub disable_blocks: bool,
    pub head: String,
    pub body: String,
    /// Base URL of the bundler's asset server.
    pub server_url: String,
}

/// Serialize for inline `<script>` use.
fn inline_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

fn object_or_empty(value: Value) -> Value {
    if value.is_null() {
        json!({})
    } else {
        value
    }
}

impl PreviewDocument {
    /// Resolve the document's inputs from the preset pipeline.
    pub async fn from_options(options: &CatalogOptions, server_url: &str) -> Result<Self> {
        let presets = &options.presets;
        let empty = || json!({});

        let framework = presets.apply(keys::FRAMEWORK, Value::Null, options).await?;
        let framework_options = framework
            .get("options")
            .cloned()
            .map_or_else(empty, object_or_empty);

        let core = presets.apply(keys::CORE, empty(), options).await?;
        let channel_options = core
            .get("channelOptions")
            .cloned()
            .map_or_else(empty, object_or_empty);

        let build = presets.apply(keys::BUILD, empty(), options).await?;
        let disable_blocks = build
            .pointer("/test/disableBlocks")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let log_level: Option<String> = presets
            .apply_as(keys::LOG_LEVEL, Value::Null, options)
            .await?;
        let head: Option<String> = presets
            .apply_as(keys::PREVIEW_HEAD, Value::Null, options)
            .await?;
        let body: Option<String> = presets
            .apply_as(keys::PREVIEW_BODY, Value::Null, options)
            .await?;

        let stories = story_rules(options)
            .await?
            .iter()
            .map(|rule| rule.descriptor(&options.working_dir))
            .collect();

        Ok(Self {
            config_type: options.config_type,
            log_level: log_level.unwrap_or_else(|| "info".to_string()),
            framework_options,
            channel_options,
            features: object_or_empty(presets.apply(keys::FEATURES, empty(), options).await?),
            stories,
            docs_options: object_or_empty(presets.apply(keys::DOCS, empty(), options).await?),
            tags_options: object_or_empty(presets.apply(keys::TAGS, empty(), options).await?),
            disable_blocks,
            head: head.unwrap_or_default(),
            body: body.unwrap_or_default(),
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    fn globals(&self) -> String {
        let mut globals = String::new();
        globals.push_str(&format!(
            "    window.CONFIG_TYPE = {};\n",
            inline_json(&self.config_type)
        ));
        globals.push_str(&format!(
            "    window.LOGLEVEL = {};\n",
            inline_json(&self.log_level)
        ));
        globals.push_str(&format!(
            "    window.FRAMEWORK_OPTIONS = {};\n",
            inline_json(&self.framework_options)
        ));
        globals.push_str(&format!(
            "    window.CHANNEL_OPTIONS = {};\n",
            inline_json(&self.channel_options)
        ));
        globals.push_str(&format!(
            "    window.FEATURES = {};\n",
            inline_json(&self.features)
        ));
        globals.push_str(&format!(
            "    window.STORIES = {};\n",
            inline_json(&self.stories)
        ));
        globals.push_str(&format!(
            "    window.DOCS_OPTIONS = {};\n",
            inline_json(&self.docs_options)
        ));
        globals.push_str(&format!(
            "    window.TAGS_OPTIONS = {};\n",
            inline_json(&self.tags_options)
        ));
        if self.disable_blocks {
            globals.push_str("    window.__STORYBOOK_BLOCKS_EMPTY_MODULE__ = {};\n");
        }
        globals
    }

    fn live_reload(&self) -> String {
        if self.config_type.is_production() {
            return String::new();
        }
        format!(
            r#"  <script>
    setTimeout(() => {{
      new EventSource('{url}/esbuild').addEventListener('change', () => {{
        console.log('[storyforge] File changed, reloading...');
        location.reload();
      }});
    }}, {LIVE_RELOAD_GRACE_MS});
  </script>
"#,
            url = self.server_url
        )
    }

    /// Render the HTML document.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Storybook</title>
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <script>
    window.module = undefined;
    window.global = window;
  </script>
  <script>
{globals}  </script>
  {head}
</head>
<body>
  {body}
  <div id="storybook-root"></div>
  <div id="storybook-docs"></div>
  <script type="module" src="{url}/{setup}"></script>
  <script type="module" src="{url}/{app}"></script>
{live_reload}</body>
</html>
"#,
            globals = self.globals(),
            head = self.head,
            body = self.body,
            url = self.server_url,
            setup = VIRTUAL_SETUP,
            app = VIRTUAL_APP,
            live_reload = self.live_reload(),
        )
    }
}

/// Render the preview document for a running asset server.
pub async fn generate_iframe_html(options: &CatalogOptions, server_url: &str) -> Result<String> {
    Ok(PreviewDocument::from_options(options, server_url)
        .await?
        .render())
}
