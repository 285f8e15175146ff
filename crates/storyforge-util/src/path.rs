//! Lexical path helpers.
//!
//! None of these functions touch the filesystem; they operate on path
//! components only, so results are stable across runs.

use std::path::{Component, Path, PathBuf};

/// Render a path with forward slashes regardless of platform.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into its parent.
///
/// Leading `..` components of a relative path are preserved.
#[must_use]
pub fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Resolve `path` against `base` unless it is already absolute, then clean it.
#[must_use]
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        clean(path)
    } else {
        clean(&base.join(path))
    }
}

/// Compute `path` relative to `base`.
///
/// Both paths are cleaned first. When they share no common prefix (e.g.
/// different drive prefixes) the cleaned `path` is returned unchanged.
#[must_use]
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = clean(path);
    let base = clean(base);

    if let Ok(stripped) = path.strip_prefix(&base) {
        return stripped.to_path_buf();
    }

    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 {
        return path;
    }

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &path_parts[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

/// Render `path` relative to `base` as a `./`-prefixed forward-slash string.
///
/// The prefix is unconditional: a path outside `base` renders as `./../x`.
#[must_use]
pub fn dot_relative(path: &Path, base: &Path) -> String {
    let rel = to_slash(&relative_to(path, base));
    if rel.is_empty() || rel == "." {
        "./".to_string()
    } else if rel.starts_with("./") {
        rel
    } else {
        format!("./{rel}")
    }
}
