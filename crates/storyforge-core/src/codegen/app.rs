use std::path::Path;
use storyforge_util::path::{dot_relative, to_slash};

use super::{js_string, AppEntryInput};

/// Story key extensions that get a sibling stylesheet.
const SCRIPT_EXTENSIONS: &[&str] = &[".tsx", ".ts", ".jsx", ".js", ".mjs"];

const CHANNEL_SETUP: &str = "const channel = createBrowserChannel({ page: 'preview' });
addons.setChannel(channel);
window.__STORYBOOK_ADDONS_CHANNEL__ = channel;

if (window.CONFIG_TYPE === 'DEVELOPMENT') {
  window.__STORYBOOK_SERVER_CHANNEL__ = channel;
}
";

const ENSURE_STYLESHEET: &str = "const ensureStylesheet = (path) => {
  if (document.querySelector('link[data-path=\"' + path + '\"]')) {
    return;
  }
  const link = document.createElement('link');
  link.rel = 'stylesheet';
  link.href = new URL(path, import.meta.url).href;
  link.setAttribute('data-path', path);
  document.head.appendChild(link);
};
";

const IMPORT_FN: &str = "  return async function importFn(path) {
    const importer = importers[path];

    if (!importer) {
      throw new Error('Story not found: ' + path + '. Available stories: ' + Object.keys(importers).join(', '));
    }

    return await importer();
  };
})();
";

const PREVIEW_INIT: &str = "window.__STORYBOOK_PREVIEW__ = window.__STORYBOOK_PREVIEW__ || new PreviewWeb(
  window.__STORYBOOK_IMPORT_FN__,
  getProjectAnnotations
);

window.__STORYBOOK_STORY_STORE__ = window.__STORYBOOK_STORY_STORE__ || window.__STORYBOOK_PREVIEW__.storyStore;
";

/// Key under which a story is registered in the import map.
#[must_use]
pub fn story_key(story: &Path, working_dir: &Path) -> String {
    dot_relative(story, working_dir)
}

/// Sibling stylesheet for a story key, when the key names a script module.
#[must_use]
pub fn stylesheet_path(key: &str) -> Option<String> {
    SCRIPT_EXTENSIONS
        .iter()
        .find_map(|ext| key.strip_suffix(ext))
        .map(|stem| format!("{stem}.css"))
}

/// Generate the app module source.
///
/// Output depends only on `input`; annotation aliases follow annotation
/// order and importers follow story order.
#[must_use]
pub fn generate_app_code(input: &AppEntryInput) -> String {
    let mut code = String::new();

    code.push_str("import { createBrowserChannel } from 'storybook/internal/channels';\n");
    code.push_str("import { addons, composeConfigs, PreviewWeb } from 'storybook/preview-api';\n");
    for (index, annotation) in input.annotations.iter().enumerate() {
        code.push_str(&format!(
            "import * as previewAnnotation{index} from {};\n",
            js_string(&annotation.import_path())
        ));
    }
    code.push('\n');

    code.push_str(CHANNEL_SETUP);
    code.push('\n');

    let aliases: Vec<String> = (0..input.annotations.len())
        .map(|index| format!("previewAnnotation{index}"))
        .collect();
    code.push_str(&format!(
        "const getProjectAnnotations = () => {{\n  return composeConfigs([{}]);\n}};\n\n",
        aliases.join(", ")
    ));

    let entries: Vec<(String, String)> = input
        .stories
        .iter()
        .map(|story| (story_key(story, &input.working_dir), to_slash(story)))
        .collect();

    if entries.iter().any(|(key, _)| stylesheet_path(key).is_some()) {
        code.push_str(ENSURE_STYLESHEET);
        code.push('\n');
    }

    code.push_str("window.__STORYBOOK_IMPORT_FN__ = (function() {\n");
    code.push_str("  const importers = {\n");
    for (key, path) in &entries {
        code.push_str(&format!("    {}: () => {{\n", js_string(key)));
        if let Some(css) = stylesheet_path(key) {
            code.push_str(&format!("      ensureStylesheet({});\n", js_string(&css)));
        }
        code.push_str(&format!("      return import({});\n", js_string(path)));
        code.push_str("    },\n");
    }
    code.push_str("  };\n\n");
    code.push_str(IMPORT_FN);
    code.push('\n');

    code.push_str(PREVIEW_INIT);
    code
}
