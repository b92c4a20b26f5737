//! Translation between SphereFS virtual paths and local filesystem paths.
//!
//! | Prefix            | Root                                   | Source-mapped |
//! |-------------------|----------------------------------------|---------------|
//! | `~/`, `~sgm/`     | project root                           | yes           |
//! | `~sys/`           | `<engine dir>/system`                  | no            |
//! | `~usr/`           | per-user data directory                | no            |
//! | *(none)*          | `<project root>/scripts`               | yes           |
//!
//! Virtual paths always use `/`. Local paths use the platform separator.

use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use crate::config::DebuggerConfig;
use crate::paths::source_map::SourceMap;

const SCRIPTS_DIR: &str = "scripts";

/// Which root a local path was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Source,
    System,
    User,
}

/// Bidirectional, source-map aware path translator.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PathResolver {
    source_root: PathBuf,
    system_root: PathBuf,
    user_root: PathBuf,
    source_map: SourceMap,
}

impl PathResolver {
    /// Build a resolver from explicit roots.
    #[must_use]
    pub fn new(
        source_root: impl Into<PathBuf>,
        system_root: impl Into<PathBuf>,
        user_root: impl Into<PathBuf>,
        source_map: SourceMap,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            system_root: system_root.into(),
            user_root: user_root.into(),
            source_map,
        }
    }

    /// Build a resolver for a configured project, loading its source map.
    #[must_use]
    pub fn from_config(config: &DebuggerConfig) -> Self {
        Self::new(
            config.project_root.clone(),
            config.system_dir(),
            config.user_data_dir(),
            SourceMap::load(&config.source_map_path()),
        )
    }

    /// The source map consulted for `~/` and bare paths.
    #[must_use]
    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Project root that `~/` paths resolve against.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Resolve a virtual path into a local filesystem path.
    ///
    /// Absolute input is returned unchanged.
    #[must_use]
    pub fn resolve(&self, virtual_path: &str) -> PathBuf {
        if Path::new(virtual_path).is_absolute() {
            return PathBuf::from(virtual_path);
        }

        if let Some(rest) = virtual_path
            .strip_prefix("~/")
            .or_else(|| virtual_path.strip_prefix("~sgm/"))
        {
            let mapped = self.source_map.lookup(rest).unwrap_or(rest);
            self.source_root.join(to_local(mapped))
        } else if let Some(rest) = virtual_path.strip_prefix("~sys/") {
            self.system_root.join(to_local(rest))
        } else if let Some(rest) = virtual_path.strip_prefix("~usr/") {
            self.user_root.join(to_local(rest))
        } else {
            let scripted = format!("{SCRIPTS_DIR}/{virtual_path}");
            let mapped = self.source_map.lookup(&scripted).unwrap_or(&scripted);
            self.source_root.join(to_local(mapped))
        }
    }

    /// Convert a local path back into the virtual namespace.
    ///
    /// Paths under none of the roots (and relative paths) come back as-is,
    /// with separators normalized to `/`. When roots nest, the deepest one
    /// wins. `~sgm/` paths come back in their canonical `~/` form, and
    /// project files under `scripts/` come back bare.
    #[must_use]
    pub fn unresolve(&self, real_path: &Path) -> String {
        if !real_path.is_absolute() {
            return real_path.to_string_lossy().replace(MAIN_SEPARATOR, "/");
        }

        let Some((root, relative)) = self.deepest_root(real_path) else {
            return real_path.to_string_lossy().replace(MAIN_SEPARATOR, "/");
        };

        let relative = to_virtual(relative);
        match root {
            Root::System => format!("~sys/{relative}"),
            Root::User => format!("~usr/{relative}"),
            Root::Source => {
                let key = self
                    .source_map
                    .reverse_lookup(&relative)
                    .unwrap_or(&relative);
                match key.strip_prefix("scripts/") {
                    Some(bare) if !bare.is_empty() => bare.to_owned(),
                    _ => format!("~/{key}"),
                }
            }
        }
    }

    fn deepest_root<'p>(&self, real_path: &'p Path) -> Option<(Root, &'p Path)> {
        [
            (Root::Source, &self.source_root),
            (Root::System, &self.system_root),
            (Root::User, &self.user_root),
        ]
        .into_iter()
        .filter_map(|(root, base)| {
            real_path
                .strip_prefix(base)
                .ok()
                .map(|rel| (root, base.components().count(), rel))
        })
        .max_by_key(|(_, depth, _)| *depth)
        .map(|(root, _, rel)| (root, rel))
    }
}

/// Split a `/`-separated virtual path into a local relative path.
fn to_local(virtual_path: &str) -> PathBuf {
    virtual_path
        .split(|c| c == '/' || c == MAIN_SEPARATOR)
        .filter(|part| !part.is_empty() && *part != ".")
        .collect()
}

/// Join the components of a local relative path with `/`.
fn to_virtual(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
