//! Graph builder that discovers `require` call sites and rewrites them
//!
//! The walk is depth-first and eager: when a call site names a module that is
//! not in the graph yet, that module is read, wrapped, parsed and walked in
//! full before the call site is rewritten and the walk moves on. A module is
//! therefore inserted into the graph before the module that first required it
//! finishes, which is what lets the emitter print the graph in insertion order.

use std::{
    mem,
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};
use oxc_allocator::{Allocator, Vec as ArenaVec};
use oxc_ast::ast::{Argument, CallExpression, Expression, Program, Statement};
use oxc_ast_visit::{VisitMut, walk_mut};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::{SPAN, SourceType};

use crate::{
    build_context::BuildContext,
    builtins::is_node_builtin,
    dependency_graph::ContentId,
    errors::{BundleError, Result},
    module_wrapper::wrap_module,
    resolver::ResolvedLocation,
    visitors::settle,
};

/// The rewritten entry module
#[derive(Debug)]
pub struct EntryModule<'a> {
    pub path: PathBuf,
    pub program: Program<'a>,
    /// `#!` line of the entry file, re-emitted at the top of the bundle
    pub hashbang: Option<String>,
}

/// What a call site ended up pointing at
#[derive(Debug, Clone, PartialEq, Eq)]
enum CallTarget {
    Module(ContentId),
    /// Left as a host `require`
    External,
}

/// Builds the dependency graph of one entry module into a [`BuildContext`]
#[derive(Debug)]
pub struct GraphBuilder<'a, 'ctx> {
    ctx: &'ctx mut BuildContext<'a>,
}

impl<'a, 'ctx> GraphBuilder<'a, 'ctx> {
    pub fn new(ctx: &'ctx mut BuildContext<'a>) -> Self {
        Self { ctx }
    }

    /// Parse the entry, then discover, wrap and rewrite everything it requires
    pub fn build(&mut self, entry_path: &Path) -> Result<EntryModule<'a>> {
        debug!("Building dependency graph from {}", entry_path.display());

        let text = self.ctx.cache.get_text(entry_path)?;
        let mut program = parse_source(self.ctx.allocator, entry_path, &text)?;
        let hashbang = program
            .hashbang
            .take()
            .map(|hashbang| hashbang.value.as_str().to_owned());

        let base_dir = entry_path
            .parent()
            .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
        rewrite_program(self.ctx, &mut program, &base_dir)?;

        debug!(
            "Dependency graph complete: {} modules, {} externals",
            self.ctx.graph.len(),
            self.ctx.externals.len()
        );
        Ok(EntryModule {
            path: entry_path.to_path_buf(),
            program,
            hashbang,
        })
    }
}

/// Parse `text` into an AST living in the build's arena
fn parse_source<'a>(allocator: &'a Allocator, path: &Path, text: &str) -> Result<Program<'a>> {
    let source = allocator.alloc_str(text);
    // CommonJS bodies run inside a function, so a top-level `return` is legal
    let options = ParseOptions {
        allow_return_outside_function: true,
        ..ParseOptions::default()
    };
    let parsed = Parser::new(allocator, source, SourceType::cjs())
        .with_options(options)
        .parse();
    if parsed.panicked || !parsed.errors.is_empty() {
        let message = parsed
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(BundleError::Parse {
            path: path.to_path_buf(),
            message,
        });
    }
    Ok(parsed.program)
}

/// Walk `program`, pruning guards and rewriting every `require` it reaches
fn rewrite_program<'a>(
    ctx: &mut BuildContext<'a>,
    program: &mut Program<'a>,
    base_dir: &Path,
) -> Result<()> {
    let mut rewriter = RequireRewriter {
        ctx,
        base_dir,
        error: None,
    };
    rewriter.visit_program(program);
    rewriter.error.map_or(Ok(()), Err)
}

/// Resolve a specifier and make sure its module is in the graph
fn include_module(
    ctx: &mut BuildContext<'_>,
    specifier: &str,
    base_dir: &Path,
) -> Result<CallTarget> {
    let (path, next_base_dir) = match ctx.resolver.resolve(specifier, base_dir)? {
        ResolvedLocation::External { specifier } => {
            // Configured externals are always the host's business
            if !ctx.platform.provides_builtins() && is_node_builtin(&specifier) {
                return Err(BundleError::ExternalUnavailable {
                    specifier,
                    platform: ctx.platform,
                });
            }
            if ctx.externals.insert(specifier.clone()) {
                warn!("Leaving built-in '{specifier}' to the host runtime");
            }
            return Ok(CallTarget::External);
        }
        ResolvedLocation::File {
            path,
            next_base_dir,
            ..
        } => (path, next_base_dir),
    };

    let text = ctx.cache.get_text(&path)?;
    let id = ContentId::from_source(&text);

    if ctx.graph.contains(&id) {
        trace!("'{specifier}' reuses module {}", id.short());
        return Ok(CallTarget::Module(id));
    }
    if ctx.in_progress.contains(&id) {
        debug!(
            "Cyclic require of {} ({}) from {}",
            path.display(),
            id.short(),
            base_dir.display()
        );
        return Ok(CallTarget::Module(id));
    }

    debug!("Including {} as {}", path.display(), id.short());
    // The body has to parse on its own; text that only balances against the
    // wrapper template would otherwise run outside its module scope.
    let scratch = Allocator::default();
    parse_source(&scratch, &path, &text)?;

    ctx.in_progress.insert(id.clone());
    let wrapped = wrap_module(&id, &text, ctx.instantiation);
    let mut program = parse_source(ctx.allocator, &path, &wrapped)?;
    rewrite_program(ctx, &mut program, &next_base_dir)?;
    ctx.in_progress.remove(&id);
    ctx.graph.insert(id.clone(), path, program);

    Ok(CallTarget::Module(id))
}

/// The specifier of a `require("<string>")` call
fn require_specifier<'c>(call: &'c CallExpression<'_>) -> Option<&'c str> {
    let Expression::Identifier(callee) = &call.callee else {
        return None;
    };
    if callee.name.as_str() != "require" || call.arguments.len() != 1 {
        return None;
    }
    match &call.arguments[0] {
        Argument::StringLiteral(literal) => Some(literal.value.as_str()),
        _ => None,
    }
}

/// Pre-order walk that prunes each statement before descending into it and
/// rewrites `require` calls in source order
struct RequireRewriter<'a, 'b> {
    ctx: &'b mut BuildContext<'a>,
    base_dir: &'b Path,
    /// First failure; once set the rest of the walk is skipped
    error: Option<BundleError>,
}

impl<'a> RequireRewriter<'a, '_> {
    /// Settle `stmt` in place; returns `false` when it should be removed
    fn settle_in_place(&mut self, stmt: &mut Statement<'a>) -> bool {
        let taken = mem::replace(stmt, self.ctx.ast.statement_empty(SPAN));
        match settle(taken, &self.ctx.env) {
            Some(kept) => {
                *stmt = kept;
                true
            }
            None => false,
        }
    }

    fn rewrite_call(&mut self, call: &mut CallExpression<'a>, specifier: &str) {
        match include_module(self.ctx, specifier, self.base_dir) {
            Ok(CallTarget::Module(id)) => {
                if let Expression::Identifier(callee) = &mut call.callee {
                    callee.name = self.ctx.ast.atom(&id.binding_name());
                }
                call.arguments.clear();
                self.ctx.rewritten.insert(id);
            }
            Ok(CallTarget::External) => {}
            Err(e) => self.error = Some(e),
        }
    }
}

impl<'a> VisitMut<'a> for RequireRewriter<'a, '_> {
    fn visit_statements(&mut self, stmts: &mut ArenaVec<'a, Statement<'a>>) {
        if self.error.is_some() {
            return;
        }

        let kept: Vec<bool> = stmts
            .iter_mut()
            .map(|stmt| self.settle_in_place(stmt))
            .collect();
        if kept.contains(&false) {
            let mut index = 0;
            stmts.retain(|_| {
                let keep = kept[index];
                index += 1;
                keep
            });
        }

        walk_mut::walk_statements(self, stmts);
    }

    fn visit_statement(&mut self, stmt: &mut Statement<'a>) {
        if self.error.is_some() {
            return;
        }
        // A removed guard in single-statement position (`if (a) <guard>`)
        // stays behind as an empty statement.
        self.settle_in_place(stmt);
        walk_mut::walk_statement(self, stmt);
    }

    fn visit_call_expression(&mut self, call: &mut CallExpression<'a>) {
        if self.error.is_some() {
            return;
        }
        match require_specifier(call).map(str::to_owned) {
            Some(specifier) => self.rewrite_call(call, &specifier),
            None => walk_mut::walk_call_expression(self, call),
        }
    }
}
