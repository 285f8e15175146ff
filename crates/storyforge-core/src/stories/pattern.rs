//! Glob pattern helpers.
//!
//! The filesystem globber only understands `*`, `?`, `**` and character
//! classes. Story rules routinely use `{a,b}` and `@(a|b)` alternations, so
//! patterns are expanded into plain alternatives before globbing, and
//! translated into a regex for the browser-side import-path matcher.

/// Characters that make a path segment a glob rather than a literal.
const GLOB_MAGIC: &[char] = &['*', '?', '[', '{', '('];

/// Whether a path segment contains glob syntax.
pub fn is_glob_segment(segment: &str) -> bool {
    segment.contains(GLOB_MAGIC)
}

/// Split a group body starting at `start` into its top-level alternatives.
///
/// Returns the byte index of the closing delimiter and the alternatives, or
/// `None` when the group is never closed.
fn split_group(pattern: &str, start: usize, sep: u8, close: u8) -> Option<(usize, Vec<&str>)> {
    let bytes = pattern.as_bytes();
    let mut depth = 0usize;
    let mut part_start = start;
    let mut parts = Vec::new();

    for (i, &c) in bytes.iter().enumerate().skip(start) {
        match c {
            b'{' | b'(' => depth += 1,
            b'}' | b')' if depth > 0 => depth -= 1,
            c if c == close && depth == 0 => {
                parts.push(&pattern[part_start..i]);
                return Some((i, parts));
            }
            c if c == sep && depth == 0 => {
                parts.push(&pattern[part_start..i]);
                part_start = i + 1;
            }
            _ => {}
        }
    }
    None
}

/// Locate the first alternation group at or after `from`.
///
/// Returns `(open_index, open_len, close_index, alternatives)`.
fn find_group(pattern: &str, from: usize) -> Option<(usize, usize, usize, Vec<&str>)> {
    let bytes = pattern.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        let group = match bytes[i] {
            b'{' => split_group(pattern, i + 1, b',', b'}').map(|(end, parts)| (1, end, parts)),
            b'@' if bytes.get(i + 1) == Some(&b'(') => {
                split_group(pattern, i + 2, b'|', b')').map(|(end, parts)| (2, end, parts))
            }
            _ => None,
        };
        if let Some((open_len, end, parts)) = group {
            return Some((i, open_len, end, parts));
        }
        i += 1;
    }
    None
}

/// Expand `{a,b}` and `@(a|b)` alternations into plain glob patterns.
///
/// Expansion order follows the alternatives' written order; duplicates are dropped.
pub fn expand_alternations(pattern: &str) -> Vec<String> {
    let Some((open, _, end, parts)) = find_group(pattern, 0) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[end + 1..];
    let mut out: Vec<String> = Vec::new();
    for part in parts {
        for expanded in expand_alternations(&format!("{prefix}{part}{suffix}")) {
            if !out.contains(&expanded) {
                out.push(expanded);
            }
        }
    }
    out
}

/// Anchored regex for a files glob under a literal directory prefix.
///
/// The directory is matched verbatim, so brackets or braces in a folder name
/// are not read as glob syntax.
pub fn rule_to_regex(directory: &str, files: &str) -> String {
    let directory = directory.trim_end_matches('/');
    format!("^{}/{}$", regex_lite::escape(directory), translate(files))
}

fn translate(glob: &str) -> String {
    let bytes = glob.as_bytes();
    let mut out = String::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                let at_segment_start = i == 0 || bytes[i - 1] == b'/';
                if at_segment_start && bytes.get(i + 2) == Some(&b'/') {
                    out.push_str("(?:[^/]*/)*");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            b'*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            b'?' => {
                out.push_str("[^/]");
                i += 1;
            }
            b'[' if glob[i..].contains(']') => {
                let end = i + glob[i..].find(']').unwrap_or(0);
                let class = &glob[i + 1..end];
                match class.strip_prefix('!') {
                    Some(negated) => {
                        out.push_str("[^");
                        out.push_str(negated);
                    }
                    None => {
                        out.push('[');
                        out.push_str(class);
                    }
                }
                out.push(']');
                i = end + 1;
            }
            b'{' | b'@' => match find_group(glob, i) {
                Some((open, _, end, parts)) if open == i => {
                    let alternatives: Vec<String> = parts.iter().map(|p| translate(p)).collect();
                    out.push_str("(?:");
                    out.push_str(&alternatives.join("|"));
                    out.push(')');
                    i = end + 1;
                }
                _ => {
                    out.push_str(&regex_lite::escape(&glob[i..=i]));
                    i += 1;
                }
            },
            _ => {
                let ch = glob[i..].chars().next().unwrap_or_default();
                out.push_str(&regex_lite::escape(ch.encode_utf8(&mut [0u8; 4])));
                i += ch.len_utf8().max(1);
            }
        }
    }

    out
}
