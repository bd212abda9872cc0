//! Expansion of glob patterns into a de-duplicated list of files.

use crate::errors::Result;
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Controls how patterns are resolved against the filesystem.
#[derive(Debug, Clone)]
pub struct FinderOptions {
    /// Directory that relative patterns are resolved against.
    pub cwd: PathBuf,
    /// Globs for files that must never be returned.
    pub exclude: Vec<String>,
    /// Skip hidden files and honour `.gitignore` style rules while walking.
    pub respect_ignore: bool,
}

impl FinderOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            exclude: Vec::new(),
            respect_ignore: true,
        }
    }
}

/// What a single pattern resolved to.
enum Target {
    /// The pattern names an existing file.
    File(PathBuf),
    /// Walk `root`; keep files accepted by `matcher` (all files when `None`).
    Walk {
        root: PathBuf,
        matcher: Option<GlobMatcher>,
        absolute: bool,
        max_depth: Option<usize>,
    },
}

/// Finds all files matched by `patterns`.
///
/// Files come back in pattern order and, within one pattern, in sorted walk
/// order. A file matched by several patterns is listed once, at its first
/// match. Patterns that match nothing are not an error.
pub fn find_files(patterns: &[String], options: &FinderOptions) -> Result<Vec<PathBuf>> {
    let exclude = build_glob_set(&options.exclude)?;
    let targets = patterns
        .iter()
        .map(|p| resolve_pattern(p, &options.cwd))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for (pattern, target) in patterns.iter().zip(targets) {
        let before = files.len();
        match target {
            Target::File(path) => {
                if !is_excluded(&path, &options.cwd, &exclude) && seen.insert(path.clone()) {
                    files.push(path);
                }
            }
            Target::Walk {
                root,
                matcher,
                absolute,
                max_depth,
            } => {
                if !root.exists() {
                    debug!("Pattern {} has no existing base directory", pattern);
                    continue;
                }
                for path in walk_files(&root, options.respect_ignore, max_depth) {
                    if let Some(matcher) = &matcher {
                        let candidate = if absolute {
                            Some(path.as_path())
                        } else {
                            path.strip_prefix(&options.cwd).ok()
                        };
                        if !candidate.is_some_and(|c| matcher.is_match(c)) {
                            continue;
                        }
                    }
                    if is_excluded(&path, &options.cwd, &exclude) {
                        continue;
                    }
                    if seen.insert(path.clone()) {
                        files.push(path);
                    }
                }
            }
        }
        debug!("Pattern {} matched {} new files", pattern, files.len() - before);
    }

    Ok(files)
}

fn resolve_pattern(pattern: &str, cwd: &Path) -> Result<Target> {
    let trimmed = pattern.strip_prefix("./").unwrap_or(pattern);
    let absolute = Path::new(trimmed).is_absolute();
    let resolved = cwd.join(trimmed);

    if resolved.is_file() {
        return Ok(Target::File(resolved));
    }
    if resolved.is_dir() {
        return Ok(Target::Walk {
            root: resolved,
            matcher: None,
            absolute,
            max_depth: None,
        });
    }

    let matcher = GlobBuilder::new(trimmed)
        .literal_separator(true)
        .build()?
        .compile_matcher();

    let base = literal_base(trimmed);
    let max_depth = walk_depth(trimmed, &base);
    Ok(Target::Walk {
        root: cwd.join(base),
        matcher: Some(matcher),
        absolute,
        max_depth,
    })
}

/// The leading directories of `pattern` that contain no glob syntax.
fn literal_base(pattern: &str) -> PathBuf {
    let components: Vec<Component> = Path::new(pattern).components().collect();
    let mut base = PathBuf::new();
    for component in components.iter().take(components.len().saturating_sub(1)) {
        if component
            .as_os_str()
            .to_str()
            .is_some_and(|s| s.contains(['*', '?', '[', '{']))
        {
            break;
        }
        base.push(component);
    }
    base
}

/// How many levels below `base` a match of `pattern` can sit.
///
/// `None` when the pattern can cross directories: `**`, or a `{..}`
/// alternation with a separator inside.
fn walk_depth(pattern: &str, base: &Path) -> Option<usize> {
    if pattern.contains("**") || has_separator_in_braces(pattern) {
        return None;
    }
    Some(Path::new(pattern).components().count() - base.components().count())
}

fn has_separator_in_braces(pattern: &str) -> bool {
    let mut nesting = 0usize;
    for ch in pattern.chars() {
        match ch {
            '{' => nesting += 1,
            '}' => nesting = nesting.saturating_sub(1),
            '/' if nesting > 0 => return true,
            _ => {}
        }
    }
    false
}

fn walk_files(root: &Path, respect_ignore: bool, max_depth: Option<usize>) -> Vec<PathBuf> {
    let mut walker = WalkBuilder::new(root);
    walker
        .standard_filters(respect_ignore)
        .max_depth(max_depth)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for entry in walker.build() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_some_and(|t| t.is_file()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => warn!("Skipping unreadable entry under {}: {}", root.display(), e),
        }
    }
    files
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.strip_prefix("./").unwrap_or(pattern);
        builder.add(GlobBuilder::new(trimmed).literal_separator(true).build()?);
    }
    Ok(builder.build()?)
}

fn is_excluded(path: &Path, cwd: &Path, exclude: &GlobSet) -> bool {
    if exclude.is_empty() {
        return false;
    }
    exclude.is_match(path)
        || path
            .strip_prefix(cwd)
            .is_ok_and(|relative| exclude.is_match(relative))
}
