//! Built-in bundler plugins.
//!
//! Registered in this order ahead of any user plugins:
//!
//! 1. [`GlobalExternalsPlugin`] rewrites preview-runtime imports to globals
//! 2. [`VirtualModulesPlugin`] serves `virtualSetup.js` and `virtualApp.js`
//! 3. [`DocGenPlugin`] attaches component documentation
//! 4. [`ExportOrderPlugin`] records story export order

mod docgen;
mod export_order;
mod global_externals;
mod virtual_modules;

pub use docgen::DocGenPlugin;
pub use export_order::{named_exports, ExportOrderPlugin};
pub use global_externals::{GlobalExternalsPlugin, GLOBAL_EXTERNALS_NAMESPACE};
pub use virtual_modules::{VirtualModulesPlugin, VIRTUAL_NAMESPACE};

use std::sync::Arc;

use crate::bundler::Plugin;
use crate::config::CatalogOptions;
use crate::externals::{get_global_externals_mapping, preview_globals};

/// The built-in plugins, in registration order.
#[must_use]
pub fn builtin_plugins(options: &CatalogOptions) -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(GlobalExternalsPlugin::new(get_global_externals_mapping(
            &preview_globals(),
        ))),
        Arc::new(VirtualModulesPlugin::new(options.clone())),
        Arc::new(DocGenPlugin::new(options.doc_extractor.clone())),
        Arc::new(ExportOrderPlugin),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let options = CatalogOptions::new("/repo/.storybook", "/repo");
        let plugins = builtin_plugins(&options);
        let names: Vec<&str> = plugins.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["global-externals", "virtual-modules", "docgen", "export-order"]
        );
    }
}
