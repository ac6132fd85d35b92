//! Shared type definitions for the cjspack crate
//!
//! This module contains common types that are used across multiple components
//! of the bundler, ensuring consistency and avoiding circular dependencies.

use serde::Deserialize;

/// Classification of a resolved module based on where it was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Reached through a relative specifier (`./x`, `../y`)
    Project,

    /// Installed under the package directory (e.g. `node_modules/react`)
    Package,

    /// Provided by the host platform rather than the filesystem
    BuiltIn,
}

impl ModuleKind {
    /// Check if this module is provided by the host
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::BuiltIn)
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Package => write!(f, "package"),
            Self::BuiltIn => write!(f, "built-in"),
        }
    }
}

/// Host platform the bundle will run on
///
/// Decides whether built-in specifiers such as `fs` or `path` can be passed
/// through to the host's own `require`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Node,
    Browser,
}

impl Platform {
    /// Whether the host supplies built-in modules at runtime
    pub fn provides_builtins(&self) -> bool {
        matches!(self, Self::Node)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Browser => write!(f, "browser"),
        }
    }
}

/// How a bundled module body is executed when its binding is called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Instantiation {
    /// First call runs the body, later calls return the cached exports
    #[default]
    Memoized,

    /// Every call re-runs the module body with a fresh exports object
    Reexecute,
}

impl std::fmt::Display for Instantiation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memoized => write!(f, "memoized"),
            Self::Reexecute => write!(f, "reexecute"),
        }
    }
}
