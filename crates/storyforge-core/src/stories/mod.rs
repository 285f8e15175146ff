//! Story discovery.
//!
//! Turns the catalog's `stories` entries into normalized glob rules, then
//! expands those rules against the filesystem into a sorted, deduplicated
//! list of absolute story file paths.
//!
//! ```text
//! "../stories/**/*.stories.@(ts|tsx)"
//!   → StoryGlobRule { directory: /repo/stories, files: "**/*.stories.@(ts|tsx)" }
//!   → /repo/stories/**/*.stories.ts, /repo/stories/**/*.stories.tsx
//!   → [/repo/stories/a.stories.tsx, /repo/stories/b.stories.ts]
//! ```

pub mod pattern;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use storyforge_util::path::{absolutize, dot_relative, to_slash};

use crate::config::CatalogOptions;
use crate::error::{Error, Result};
use crate::presets::keys;

/// Files pattern used when an entry names only a directory.
pub const DEFAULT_FILES_PATTERN: &str = "**/*.@(mdx|stories.@(js|jsx|mjs|ts|tsx))";

/// A `stories` entry as written in the catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoriesEntry {
    /// A glob, directory or file path relative to the config directory.
    Glob(String),
    /// An explicit directory + files pair.
    Specifier {
        directory: String,
        #[serde(default)]
        files: Option<String>,
        #[serde(default, rename = "titlePrefix")]
        title_prefix: Option<String>,
    },
}

/// A normalized story rule: absolute base directory plus a files pattern.
#[derive(Debug, Clone)]
pub struct StoryGlobRule {
    /// Absolute base directory.
    pub directory: PathBuf,
    /// Files pattern relative to `directory`.
    pub files: String,
    /// Title prefix for stories matched by this rule.
    pub title_prefix: String,
    /// Matcher for `./`-prefixed story keys, when the pattern translates cleanly.
    pub matcher: Option<Regex>,
}

/// Serializable form of a rule, as published to the preview runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDescriptor {
    pub title_prefix: String,
    pub directory: String,
    pub files: String,
    pub import_path_matcher: String,
}

impl StoryGlobRule {
    /// Absolute glob for `files` under this rule's directory, which is escaped
    /// so brackets in folder names match literally.
    fn absolute_pattern(&self, files: &str) -> String {
        join_glob(&glob::Pattern::escape(&to_slash(&self.directory)), files)
    }

    /// Describe the rule relative to the working directory.
    #[must_use]
    pub fn descriptor(&self, working_dir: &Path) -> StoryDescriptor {
        let directory = dot_relative(&self.directory, working_dir);
        let import_path_matcher = self.matcher.as_ref().map_or_else(
            || pattern::rule_to_regex(&directory, &self.files),
            |re| re.as_str().to_string(),
        );
        StoryDescriptor {
            title_prefix: self.title_prefix.clone(),
            directory,
            files: self.files.clone(),
            import_path_matcher,
        }
    }
}

fn join_glob(directory: &str, files: &str) -> String {
    if directory.ends_with('/') {
        format!("{directory}{files}")
    } else {
        format!("{directory}/{files}")
    }
}

/// Split a slash-separated glob into its literal base and the glob remainder.
fn split_glob_base(glob: &str) -> (String, Option<String>) {
    let segments: Vec<&str> = glob.split('/').collect();
    match segments.iter().position(|s| pattern::is_glob_segment(s)) {
        Some(idx) => {
            let base = segments[..idx].join("/");
            let base = if base.is_empty() && glob.starts_with('/') {
                "/".to_string()
            } else if base.is_empty() {
                ".".to_string()
            } else {
                base
            };
            (base, Some(segments[idx..].join("/")))
        }
        None => (glob.to_string(), None),
    }
}

/// Normalize one entry against the config and working directories.
#[must_use]
pub fn normalize_entry(entry: &StoriesEntry, config_dir: &Path, working_dir: &Path) -> StoryGlobRule {
    let (directory, files, title_prefix) = match entry {
        StoriesEntry::Glob(glob) => {
            let glob = glob.replace('\\', "/");
            match split_glob_base(&glob) {
                (base, Some(files)) => (absolutize(Path::new(&base), config_dir), files, String::new()),
                (literal, None) => {
                    let abs = absolutize(Path::new(&literal), config_dir);
                    if abs.is_file() {
                        let file_name = abs
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        let parent = abs.parent().map(Path::to_path_buf).unwrap_or_default();
                        (parent, file_name, String::new())
                    } else {
                        (abs, DEFAULT_FILES_PATTERN.to_string(), String::new())
                    }
                }
            }
        }
        StoriesEntry::Specifier {
            directory,
            files,
            title_prefix,
        } => (
            absolutize(Path::new(directory), config_dir),
            files.clone().unwrap_or_else(|| DEFAULT_FILES_PATTERN.to_string()),
            title_prefix.clone().unwrap_or_default(),
        ),
    };

    let matcher = Regex::new(&pattern::rule_to_regex(
        &dot_relative(&directory, working_dir),
        &files,
    ))
    .ok();

    StoryGlobRule {
        directory,
        files,
        title_prefix,
        matcher,
    }
}

/// Normalize every entry, preserving order.
#[must_use]
pub fn normalize_stories(
    entries: &[StoriesEntry],
    config_dir: &Path,
    working_dir: &Path,
) -> Vec<StoryGlobRule> {
    entries
        .iter()
        .map(|entry| normalize_entry(entry, config_dir, working_dir))
        .collect()
}

/// Expand one rule against the filesystem.
///
/// Invalid patterns and unreadable entries yield nothing for this rule only.
fn expand_rule(rule: &StoryGlobRule) -> Vec<PathBuf> {
    let allow_node_modules =
        to_slash(&rule.directory).contains("node_modules") || rule.files.contains("node_modules");
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut matches = Vec::new();
    for files in pattern::expand_alternations(&rule.files) {
        let expanded = rule.absolute_pattern(&files);
        let paths = match glob::glob_with(&expanded, options) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!(pattern = %expanded, error = %e, "Invalid story glob; skipping rule");
                return Vec::new();
            }
        };
        for entry in paths {
            match entry {
                Ok(path) => {
                    if !allow_node_modules
                        && path.components().any(|c| c.as_os_str() == "node_modules")
                    {
                        continue;
                    }
                    if path.is_file() {
                        matches.push(path);
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Unreadable path while globbing stories");
                }
            }
        }
    }
    matches
}

/// Expand rules into a sorted, deduplicated list of absolute story paths.
///
/// Sorting is by the forward-slash rendering of each path so the order is
/// identical across platforms and runs.
#[must_use]
pub fn locate_stories(rules: &[StoryGlobRule]) -> Vec<PathBuf> {
    let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();
    for rule in rules {
        for path in expand_rule(rule) {
            found.entry(to_slash(&path)).or_insert(path);
        }
    }
    found.into_values().collect()
}

/// Read and normalize the `stories` preset value.
pub async fn story_rules(options: &CatalogOptions) -> Result<Vec<StoryGlobRule>> {
    let entries: Vec<StoriesEntry> = options
        .presets
        .apply_as(keys::STORIES, serde_json::json!([]), options)
        .await?;
    Ok(normalize_stories(
        &entries,
        &options.config_dir,
        &options.working_dir,
    ))
}

/// Discover all story files for the catalog.
pub async fn list_stories(options: &CatalogOptions) -> Result<Vec<PathBuf>> {
    let rules = story_rules(options).await?;
    let stories = tokio::task::spawn_blocking(move || locate_stories(&rules))
        .await
        .map_err(|e| Error::other(format!("Story discovery task failed: {e}")))?;
    tracing::debug!(count = stories.len(), "Discovered stories");
    Ok(stories)
}
