//! AST visitor implementations for cjspack
//!
//! Traversal steps over oxc's JavaScript AST, currently the build-time pruning
//! of environment guards.

mod env_pruner;

pub use env_pruner::{Pruned, evaluate_condition, prune_statement, settle};
