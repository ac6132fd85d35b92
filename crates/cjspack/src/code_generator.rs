//! Bundle emission
//!
//! Prints every module wrapper in graph insertion order, appends the rewritten
//! entry module unwrapped, and encloses the lot in a single immediately
//! invoked function so bundle-internal bindings never reach the host's global
//! scope.

use log::debug;
use oxc_codegen::Codegen;
use rustc_hash::FxHashSet;

use crate::{
    dependency_graph::{ContentId, DependencyGraph},
    errors::{BundleError, Result},
    graph_builder::EntryModule,
    minifier,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions<'o> {
    pub minify: bool,
    /// When set, the bundle defines `process.env.NODE_ENV` as this value
    pub process_shim: Option<&'o str>,
}

/// Serialize the graph and entry module into the final artifact text
///
/// `rewritten` holds every id a call site was rewritten to during the build.
pub fn emit(
    entry: &EntryModule<'_>,
    graph: &DependencyGraph<'_>,
    rewritten: &FxHashSet<ContentId>,
    options: &EmitOptions<'_>,
) -> Result<String> {
    verify_bindings(graph, rewritten)?;

    let mut body = String::new();
    if let Some(env) = options.process_shim {
        body.push_str(&process_shim(env));
        body.push('\n');
    }
    for module in graph.iter() {
        body.push_str(&Codegen::new().build(&module.wrapped_ast).code);
        body.push('\n');
    }
    body.push_str(&Codegen::new().build(&entry.program).code);

    let wrapped = format!("(function () {{\n{body}\n}})();\n");
    let mut output = if options.minify {
        minifier::minify(&wrapped)?
    } else {
        wrapped
    };

    if let Some(hashbang) = &entry.hashbang {
        output.insert_str(0, &format!("#!{hashbang}\n"));
    }

    debug!(
        "Emitted {} modules plus entry {} ({} bytes)",
        graph.len(),
        entry.path.display(),
        output.len()
    );
    Ok(output)
}

/// Check that every rewritten call site names a module present in the graph
///
/// Calls that merely look like bindings, such as those inside a prebuilt
/// bundle that is itself required, are not call sites of this build.
fn verify_bindings(graph: &DependencyGraph<'_>, rewritten: &FxHashSet<ContentId>) -> Result<()> {
    match rewritten.iter().filter(|id| !graph.contains(id)).min() {
        Some(missing) => Err(BundleError::UnknownBinding {
            name: missing.binding_name(),
        }),
        None => Ok(()),
    }
}

fn process_shim(env: &str) -> String {
    let value = serde_json::Value::String(env.to_owned());
    format!("var process = {{ env: {{ NODE_ENV: {value} }} }};")
}
