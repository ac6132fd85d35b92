//! Content-addressed dependency graph
//!
//! Modules are identified by the SHA-256 of their raw source text, so two
//! files with byte-identical contents collapse into a single entry. Entries
//! are kept in first-discovery order, which is the order the emitter prints
//! them in.

use std::{fmt, path::PathBuf};

use indexmap::IndexMap;
use oxc_ast::ast::Program;
use sha2::{Digest, Sha256};

/// Prefix of the identifier every bundled module is bound to
pub const BINDING_PREFIX: &str = "require_";

/// Hex-encoded SHA-256 of a module's source text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    pub fn from_source(source: &str) -> Self {
        let digest = Sha256::digest(source.as_bytes());
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier the module's wrapper is bound to in the bundle
    pub fn binding_name(&self) -> String {
        format!("{BINDING_PREFIX}{}", self.0)
    }

    /// Abbreviated form for log output
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One bundled module: its wrapped, rewritten AST plus where it came from
pub struct GraphEntry<'a> {
    pub id: ContentId,
    /// First path this content was found at
    pub path: PathBuf,
    pub wrapped_ast: Program<'a>,
    pub discovery_order: usize,
}

impl fmt::Debug for GraphEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphEntry")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("discovery_order", &self.discovery_order)
            .finish_non_exhaustive()
    }
}

/// Insertion-ordered table of discovered modules keyed by content id
#[derive(Debug, Default)]
pub struct DependencyGraph<'a> {
    entries: IndexMap<ContentId, GraphEntry<'a>>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert a module; the first insertion for an id wins
    ///
    /// Returns `false` when the id was already present and the new AST was
    /// dropped.
    pub fn insert(&mut self, id: ContentId, path: PathBuf, wrapped_ast: Program<'a>) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        let discovery_order = self.entries.len();
        self.entries.insert(
            id.clone(),
            GraphEntry {
                id,
                path,
                wrapped_ast,
                discovery_order,
            },
        );
        true
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &ContentId) -> Option<&GraphEntry<'a>> {
        self.entries.get(id)
    }

    /// Entries in first-discovery order
    pub fn iter(&self) -> impl Iterator<Item = &GraphEntry<'a>> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ContentId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
