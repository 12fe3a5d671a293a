use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

const META_CHARS: &[char] = &['*', '?', '[', '{'];

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern: {0}")]
    Invalid(#[from] globset::Error),
    #[error("no files found matching pattern '{0}'")]
    NoMatches(String),
}

/// Expands a shell-style pattern into existing paths, sorted and deduplicated.
/// Directories match too. Relative patterns resolve against the working
/// directory.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>, PatternError> {
    expand_in(Path::new("."), pattern)
}

/// Like [`expand`] with relative patterns resolved against `root`. Returned
/// paths keep the form of the pattern: relative patterns yield paths relative
/// to `root`, with any leading `./` dropped.
pub fn expand_in(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, PatternError> {
    if !pattern.contains(META_CHARS) {
        return if root.join(pattern).symlink_metadata().is_ok() {
            Ok(vec![PathBuf::from(pattern)])
        } else {
            Err(PatternError::NoMatches(pattern.to_string()))
        };
    }

    let normalized = strip_current_dir(pattern);
    let matcher = GlobBuilder::new(normalized)
        .literal_separator(true)
        .build()?
        .compile_matcher();

    let (base, depth) = walk_root(normalized);
    let absolute = base.is_absolute();
    let walk_from = if absolute {
        base
    } else if base == Path::new(".") {
        root.to_path_buf()
    } else {
        root.join(base)
    };
    let mut walker = WalkDir::new(&walk_from).min_depth(1);
    if let Some(depth) = depth {
        walker = walker.max_depth(depth);
    }

    let mut matches = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping unreadable path");
                continue;
            }
        };
        let path = entry.path();
        let candidate = if absolute {
            path
        } else {
            path.strip_prefix(root).unwrap_or(path)
        };
        if matcher.is_match(candidate) {
            matches.push(candidate.to_path_buf());
        }
    }

    if matches.is_empty() {
        return Err(PatternError::NoMatches(pattern.to_string()));
    }
    matches.sort();
    matches.dedup();
    Ok(matches)
}

fn strip_current_dir(pattern: &str) -> &str {
    let mut rest = pattern;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.trim_start_matches('/');
    }
    rest
}

/// Longest leading run of literal components, and how deep below it the
/// pattern can reach. `None` means unbounded (`**`).
fn walk_root(pattern: &str) -> (PathBuf, Option<usize>) {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal = parts
        .iter()
        .take_while(|part| !part.contains(META_CHARS))
        .count();

    let base = match &parts[..literal] {
        [] => PathBuf::from("."),
        [""] => PathBuf::from("/"),
        prefix => PathBuf::from(prefix.join("/")),
    };
    let depth = if pattern.contains("**") {
        None
    } else {
        Some(parts.len() - literal)
    };
    (base, depth)
}
