//! CommonJS bundler: resolves a `require()` graph from an entry file, prunes
//! `process.env.NODE_ENV` guards at build time, and emits one self-contained
//! script.

pub mod build_context;
pub mod builtins;
pub mod code_generator;
pub mod config;
pub mod dependency_graph;
pub mod errors;
pub mod graph_builder;
pub mod minifier;
pub mod module_cache;
pub mod module_wrapper;
pub mod orchestrator;
pub mod resolver;
pub mod types;
pub mod visitors;

pub use errors::{BundleError, Result};
pub use orchestrator::{BundleOrchestrator, BundleOutput};
