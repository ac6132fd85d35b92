//! Error taxonomy for a bundle build.
//!
//! Every variant is fatal: the first error raised anywhere in the dependency
//! walk aborts the build before any output is written.

use std::path::PathBuf;

use crate::types::Platform;

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Specifier unresolvable from the given base directory
    #[error("cannot resolve '{specifier}' from {}", base_dir.display())]
    Resolution {
        specifier: String,
        base_dir: PathBuf,
    },

    /// Malformed source in an otherwise resolved module
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A package manifest that exists but cannot be understood
    #[error("invalid package manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// A built-in module the target platform does not provide
    #[error("built-in module '{specifier}' is not available on the {platform} platform")]
    ExternalUnavailable {
        specifier: String,
        platform: Platform,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rewritten call site that points at no graph entry
    #[error("rewritten call site references unknown module binding '{name}'")]
    UnknownBinding { name: String },
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from module resolution
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }
}

pub type Result<T> = std::result::Result<T, BundleError>;
