use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::bundler::{HookResult, LoadArgs, LoadResult, Loader, Plugin, FILE_NAMESPACE};
use crate::docgen::{inject_docgen, should_transform, DocExtractor, DocGenOutcome};

/// Attaches `__docgenInfo` to components defined in project source files.
///
/// Never fails a load: unreadable files and extraction errors fall through to
/// the bundler's default loader.
pub struct DocGenPlugin {
    extractor: Arc<dyn DocExtractor>,
}

impl DocGenPlugin {
    pub fn new(extractor: Arc<dyn DocExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Plugin for DocGenPlugin {
    fn name(&self) -> &str {
        "docgen"
    }

    async fn load(&self, args: &LoadArgs) -> HookResult<Option<LoadResult>> {
        if args.namespace != FILE_NAMESPACE || !should_transform(&args.path) {
            return Ok(None);
        }

        let path = Path::new(&args.path);
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(e) => {
                tracing::debug!(path = %args.path, error = %e, "docgen skipped unreadable file");
                return Ok(None);
            }
        };

        match inject_docgen(self.extractor.as_ref(), &source, path) {
            DocGenOutcome::Modified(contents) => Ok(Some(LoadResult {
                contents,
                loader: Loader::from_path(path),
                resolve_dir: None,
            })),
            DocGenOutcome::Unchanged => Ok(None),
            DocGenOutcome::Warning(message) => {
                tracing::warn!(path = %args.path, error = %message, "Error parsing documentation");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docgen::{ComponentDoc, DisabledDocgen, DocGenError};
    use std::fs;
    use tempfile::tempdir;

    struct LocalComponent;

    impl DocExtractor for LocalComponent {
        fn parse(&self, _source: &str, filename: &Path) -> Result<Vec<ComponentDoc>, DocGenError> {
            Ok(vec![ComponentDoc {
                actual_name: Some("Button".to_string()),
                defined_in_file: Some(filename.to_path_buf()),
                info: serde_json::Map::new(),
            }])
        }
    }

    struct Broken;

    impl DocExtractor for Broken {
        fn parse(&self, _source: &str, _filename: &Path) -> Result<Vec<ComponentDoc>, DocGenError> {
            Err(DocGenError::Parse("bad syntax".to_string()))
        }
    }

    #[tokio::test]
    async fn test_injects_and_sets_loader() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("Button.tsx");
        fs::write(&file, "export const Button = () => null;").unwrap();

        let plugin = DocGenPlugin::new(Arc::new(LocalComponent));
        let loaded = plugin
            .load(&LoadArgs::file(file.to_string_lossy()))
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.contents.contains("Button.__docgenInfo={}"));
        assert_eq!(loaded.loader, Some(Loader::Tsx));
    }

    #[tokio::test]
    async fn test_skips_story_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("Button.stories.tsx");
        fs::write(&file, "export default {};").unwrap();

        let plugin = DocGenPlugin::new(Arc::new(LocalComponent));
        assert!(plugin
            .load(&LoadArgs::file(file.to_string_lossy()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_failures_pass_through() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("broken.ts");
        fs::write(&file, "const = ;").unwrap();

        let extractors: Vec<Arc<dyn DocExtractor>> = vec![Arc::new(Broken), Arc::new(DisabledDocgen)];
        for extractor in extractors {
            let plugin = DocGenPlugin::new(extractor);
            assert!(plugin
                .load(&LoadArgs::file(file.to_string_lossy()))
                .await
                .unwrap()
                .is_none());
        }
    }

    #[tokio::test]
    async fn test_missing_file_passes_through() {
        let plugin = DocGenPlugin::new(Arc::new(LocalComponent));
        assert!(plugin
            .load(&LoadArgs::file("/definitely/not/here.tsx"))
            .await
            .unwrap()
            .is_none());
    }
}
