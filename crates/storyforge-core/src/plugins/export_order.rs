use async_trait::async_trait;
use std::path::Path;

use crate::bundler::{HookResult, LoadArgs, LoadResult, Loader, Plugin, FILE_NAMESPACE};

const EXPORT_ORDER_BINDING: &str = "__namedExportsOrder";

/// Records the declaration order of a story file's named exports.
///
/// The preview runtime sorts stories by `__namedExportsOrder` when present,
/// since module namespace objects enumerate exports alphabetically.
pub struct ExportOrderPlugin;

fn is_story_module(path: &str) -> bool {
    [".stories.ts", ".stories.tsx", ".stories.js", ".stories.jsx"]
        .iter()
        .any(|suffix| path.ends_with(suffix))
}

/// Named exports declared with `export const|let|var|function|class`, in source order.
#[must_use]
pub fn named_exports(code: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    if let Ok(re) = regex_lite::Regex::new(
        r"(?m)^\s*export\s+(?:const|let|var|async\s+function\*?|function\*?|class)\s+([A-Za-z_$][\w$]*)",
    ) {
        for caps in re.captures_iter(code) {
            let name = &caps[1];
            if name != "default" && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Append the export-order binding, or `None` when there is nothing to add.
#[must_use]
pub fn inject_export_order(code: &str) -> Option<String> {
    if code.contains(EXPORT_ORDER_BINDING) {
        return None;
    }
    let names = named_exports(code);
    if names.is_empty() {
        return None;
    }
    let list = serde_json::Value::from(names).to_string();
    Some(format!(
        "{}\n\nexport const {EXPORT_ORDER_BINDING} = {list};\n",
        code.trim_end()
    ))
}

#[async_trait]
impl Plugin for ExportOrderPlugin {
    fn name(&self) -> &str {
        "export-order"
    }

    async fn load(&self, args: &LoadArgs) -> HookResult<Option<LoadResult>> {
        if args.namespace != FILE_NAMESPACE || !is_story_module(&args.path) {
            return Ok(None);
        }

        let path = Path::new(&args.path);
        let Ok(source) = tokio::fs::read_to_string(path).await else {
            return Ok(None);
        };

        Ok(inject_export_order(&source).map(|contents| LoadResult {
            contents,
            loader: Loader::from_path(path),
            resolve_dir: None,
        }))
    }
}
