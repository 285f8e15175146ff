//! Global externals.
//!
//! The preview runtime is loaded once by the host page and published on
//! `window`. Story bundles must reuse that instance, so imports of the
//! runtime's modules are rewritten to reads of the matching global.

use serde::Serialize;
use std::collections::BTreeMap;

/// Linkage of a substituted module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// CommonJS-style: the whole module object is the global.
    Cjs,
}

/// How one external module maps onto a global variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalExternal {
    pub var_name: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
}

/// Runtime modules the host page publishes, keyed by import specifier.
pub const PREVIEW_GLOBALS: &[(&str, &str)] = &[
    ("@storybook/global", "__STORYBOOK_MODULE_GLOBAL__"),
    ("storybook/actions", "__STORYBOOK_MODULE_ACTIONS__"),
    ("storybook/internal/channels", "__STORYBOOK_MODULE_CHANNELS__"),
    (
        "storybook/internal/client-logger",
        "__STORYBOOK_MODULE_CLIENT_LOGGER__",
    ),
    ("storybook/internal/core-events", "__STORYBOOK_MODULE_CORE_EVENTS__"),
    (
        "storybook/internal/preview-errors",
        "__STORYBOOK_MODULE_CORE_EVENTS_PREVIEW_ERRORS__",
    ),
    ("storybook/internal/types", "__STORYBOOK_MODULE_TYPES__"),
    ("storybook/preview-api", "__STORYBOOK_MODULE_PREVIEW_API__"),
    ("storybook/test", "__STORYBOOK_MODULE_TEST__"),
];

/// The default specifier → global-variable table.
#[must_use]
pub fn preview_globals() -> BTreeMap<String, String> {
    PREVIEW_GLOBALS
        .iter()
        .map(|(module, var)| ((*module).to_string(), (*var).to_string()))
        .collect()
}

/// Convert a specifier → global-variable table into externals descriptors.
#[must_use]
pub fn get_global_externals_mapping(
    globals: &BTreeMap<String, String>,
) -> BTreeMap<String, GlobalExternal> {
    globals
        .iter()
        .map(|(module, var_name)| {
            (
                module.clone(),
                GlobalExternal {
                    var_name: var_name.clone(),
                    kind: ModuleKind::Cjs,
                },
            )
        })
        .collect()
}
