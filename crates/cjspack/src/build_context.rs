//! Per-build state
//!
//! A `BuildContext` is created for one bundle invocation, filled in while the
//! graph builder walks the dependency tree, read once by the emitter, and
//! dropped. Nothing in it is global, so independent builds never share state.

use indexmap::IndexSet;
use oxc_allocator::Allocator;
use oxc_ast::AstBuilder;
use rustc_hash::FxHashSet;

use crate::{
    config::Config,
    dependency_graph::{ContentId, DependencyGraph},
    module_cache::ModuleCache,
    resolver::ModuleResolver,
    types::{Instantiation, Platform},
};

pub struct BuildContext<'a> {
    /// Arena every module AST of this build is allocated in
    pub(crate) allocator: &'a Allocator,
    pub(crate) ast: AstBuilder<'a>,
    pub(crate) resolver: ModuleResolver,
    pub(crate) cache: ModuleCache,
    pub(crate) graph: DependencyGraph<'a>,
    /// Modules whose subtree is still being walked; a hit here is a cycle
    pub(crate) in_progress: FxHashSet<ContentId>,
    /// Built-in specifiers passed through to the host
    pub(crate) externals: IndexSet<String>,
    /// Every module id a call site was rewritten to
    pub(crate) rewritten: FxHashSet<ContentId>,
    pub(crate) env: String,
    pub(crate) platform: Platform,
    pub(crate) instantiation: Instantiation,
}

impl<'a> BuildContext<'a> {
    pub fn new(allocator: &'a Allocator, resolver: ModuleResolver, config: &Config) -> Self {
        Self {
            allocator,
            ast: AstBuilder::new(allocator),
            resolver,
            cache: ModuleCache::new(),
            graph: DependencyGraph::new(),
            in_progress: FxHashSet::default(),
            externals: IndexSet::new(),
            rewritten: FxHashSet::default(),
            env: config.env.clone(),
            platform: config.platform,
            instantiation: config.instantiation,
        }
    }

    pub fn graph(&self) -> &DependencyGraph<'a> {
        &self.graph
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// Built-in specifiers left for the host, in first-seen order
    pub fn externals(&self) -> &IndexSet<String> {
        &self.externals
    }

    /// Ids referenced by rewritten call sites, cycles included
    pub fn rewritten(&self) -> &FxHashSet<ContentId> {
        &self.rewritten
    }

    pub fn env(&self) -> &str {
        &self.env
    }
}

impl std::fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("resolver", &self.resolver)
            .field("cache", &self.cache)
            .field("graph", &self.graph)
            .field("in_progress", &self.in_progress)
            .field("externals", &self.externals)
            .field("rewritten", &self.rewritten)
            .field("env", &self.env)
            .field("platform", &self.platform)
            .field("instantiation", &self.instantiation)
            .finish_non_exhaustive()
    }
}
