use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::bundler::{HookResult, LoadArgs, LoadResult, Plugin, ResolveArgs, ResolveResult};
use crate::externals::{GlobalExternal, ModuleKind};

/// Namespace holding substituted modules.
pub const GLOBAL_EXTERNALS_NAMESPACE: &str = "global-externals";

/// Replaces imports of mapped modules with reads of a window global.
pub struct GlobalExternalsPlugin {
    mapping: BTreeMap<String, GlobalExternal>,
}

impl GlobalExternalsPlugin {
    pub fn new(mapping: BTreeMap<String, GlobalExternal>) -> Self {
        Self { mapping }
    }

    fn module_source(external: &GlobalExternal) -> String {
        match external.kind {
            ModuleKind::Cjs => format!(
                "module.exports = window[{}];",
                crate::codegen::js_string(&external.var_name)
            ),
        }
    }
}

#[async_trait]
impl Plugin for GlobalExternalsPlugin {
    fn name(&self) -> &str {
        "global-externals"
    }

    async fn resolve(&self, args: &ResolveArgs) -> HookResult<Option<ResolveResult>> {
        if self.mapping.contains_key(&args.path) {
            return Ok(Some(ResolveResult::in_namespace(
                &args.path,
                GLOBAL_EXTERNALS_NAMESPACE,
            )));
        }
        Ok(None)
    }

    async fn load(&self, args: &LoadArgs) -> HookResult<Option<LoadResult>> {
        if args.namespace != GLOBAL_EXTERNALS_NAMESPACE {
            return Ok(None);
        }
        Ok(self
            .mapping
            .get(&args.path)
            .map(|external| LoadResult::js(Self::module_source(external))))
    }
}
