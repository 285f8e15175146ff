//! Component documentation injection.
//!
//! Extraction is delegated to a [`DocExtractor`]. For each component the
//! extractor reports as defined in the file being transformed, a guarded
//! statement attaching the metadata to the component is appended:
//!
//! ```text
//! try {
//!     Button.__docgenInfo={"description":"..."}
//! } catch (error) {
//!     console.warn('Error setting __docgenInfo:', error)
//! };
//! ```
//!
//! The transform never fails; see [`DocGenOutcome`].

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Documentation extracted for one component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentDoc {
    /// Name the component is bound to in its defining file.
    pub actual_name: Option<String>,
    /// File that defines the component.
    pub defined_in_file: Option<PathBuf>,
    /// Metadata attached as `__docgenInfo`.
    pub info: Map<String, Value>,
}

/// Extraction failure.
#[derive(Debug, Error)]
pub enum DocGenError {
    /// The source exports no component definition. Expected for most files.
    #[error("No suitable component definition found")]
    MissingDefinition,

    #[error("{0}")]
    Parse(String),
}

/// Extracts component documentation from source text.
pub trait DocExtractor: Send + Sync {
    fn parse(&self, source: &str, filename: &Path) -> Result<Vec<ComponentDoc>, DocGenError>;
}

/// Extractor used when documentation generation is turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledDocgen;

impl DocExtractor for DisabledDocgen {
    fn parse(&self, _source: &str, _filename: &Path) -> Result<Vec<ComponentDoc>, DocGenError> {
        Err(DocGenError::MissingDefinition)
    }
}

/// Result of transforming one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocGenOutcome {
    /// Metadata was appended.
    Modified(String),
    /// Nothing to attach; the original source stands.
    Unchanged,
    /// Extraction failed; the original source stands.
    Warning(String),
}

/// Whether a module path is eligible for documentation injection.
///
/// Dependencies and story files are skipped, as is anything that is not a
/// script module.
#[must_use]
pub fn should_transform(path: &str) -> bool {
    if path.contains("node_modules") || path.contains(".stories.") {
        return false;
    }
    matches!(
        Path::new(path).extension().and_then(|e| e.to_str()),
        Some("mjs" | "js" | "jsx" | "ts" | "tsx")
    )
}

fn append_docgen_info(source: &mut String, name: &str, info_json: &str) {
    source.push_str(&format!(
        "\ntry {{\n    {name}.__docgenInfo={info_json}\n}} catch (error) {{\n    console.warn('Error setting __docgenInfo:', error)\n}};"
    ));
}

/// Attach documentation for the components `extractor` finds in `source`.
#[must_use]
pub fn inject_docgen(extractor: &dyn DocExtractor, source: &str, path: &Path) -> DocGenOutcome {
    let docs = match extractor.parse(source, path) {
        Ok(docs) => docs,
        Err(DocGenError::MissingDefinition) => return DocGenOutcome::Unchanged,
        Err(e) => return DocGenOutcome::Warning(e.to_string()),
    };

    let mut out = source.to_string();
    let mut injected = 0usize;

    for doc in docs {
        let Some(name) = doc.actual_name.filter(|n| !n.is_empty()) else {
            continue;
        };
        if doc.defined_in_file.as_deref() != Some(path) {
            continue;
        }
        let info_json = Value::Object(doc.info).to_string();
        append_docgen_info(&mut out, &name, &info_json);
        injected += 1;
    }

    if injected == 0 {
        DocGenOutcome::Unchanged
    } else {
        DocGenOutcome::Modified(out)
    }
}
