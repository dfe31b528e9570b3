//! Path sandboxing
//!
//! Every path a task touches is given relative to the recipe's base
//! directory. This module checks those paths and resolves them so that
//! nothing can land outside the base.

use crate::error::{ValidationError, ValidationResult};
use std::path::{Component, Path, PathBuf};

/// Check the shape of a caller-supplied relative path.
///
/// Rejects the empty string and anything with a `..` segment. When
/// `allow_root` is false, paths that normalise to the base itself (`.`,
/// `/`, `./`) are rejected too.
pub fn is_valid_path(path: &str, allow_root: bool) -> bool {
    if path.is_empty() {
        return false;
    }

    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return false;
    }

    allow_root || !relative_components(Path::new(path)).as_os_str().is_empty()
}

/// Validate a path option, reporting which option was at fault.
pub fn check_path(option: &'static str, path: &str, allow_root: bool) -> ValidationResult<()> {
    if path.is_empty() || path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(ValidationError::UnsafePath {
            option,
            path: path.to_string(),
        });
    }
    if !is_valid_path(path, allow_root) {
        return Err(ValidationError::RootPath { option });
    }
    Ok(())
}

/// Like [`check_path`] for an optional option that must be present.
pub fn require_path<'a>(
    option: &'static str,
    path: &'a Option<String>,
    allow_root: bool,
) -> ValidationResult<&'a str> {
    let path = path
        .as_deref()
        .ok_or(ValidationError::MissingOption(option))?;
    check_path(option, path, allow_root)?;
    Ok(path)
}

/// Reduce a path to its normal components, dropping roots, prefixes and
/// `.`. A `..` pops the previous component and never climbs above the
/// start.
fn relative_components(path: &Path) -> PathBuf {
    let mut rel = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            Component::ParentDir => {
                rel.pop();
            }
            Component::Normal(seg) => rel.push(seg),
        }
    }
    rel
}

/// A base directory that scopes all relative paths of one recipe run
#[derive(Debug, Clone)]
pub struct Sandbox {
    base: PathBuf,
}

impl Sandbox {
    /// Create a sandbox rooted at `base`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Sandbox { base: base.into() }
    }

    /// The base directory
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a relative path below the base.
    ///
    /// This does not rely on [`is_valid_path`] having been called: traversal
    /// and absolute components are stripped here as well.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base.join(relative_components(Path::new(path)))
    }

    /// Whether `path` is the base directory itself.
    ///
    /// Compared component-wise, so trailing separators on either side do
    /// not matter.
    pub fn is_base(&self, path: &Path) -> bool {
        path.components().eq(self.base.components())
    }
}
