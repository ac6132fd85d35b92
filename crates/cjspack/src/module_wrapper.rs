//! Module wrapper templates
//!
//! Each bundled module becomes a `const require_<id> = ...` binding whose
//! value, when called, runs the module body against its own `module` and
//! `exports` and yields `module.exports`.

use crate::{dependency_graph::ContentId, types::Instantiation};

/// Wrap a module body in the template for the chosen instantiation mode
///
/// The body is placed on its own lines so line comments at its end cannot
/// swallow the closing braces.
pub fn wrap_module(id: &ContentId, source: &str, instantiation: Instantiation) -> String {
    let binding = id.binding_name();
    let body = strip_hashbang(source);
    match instantiation {
        // The module object is published before the body runs, so a cyclic
        // require sees the partially populated exports instead of recursing.
        Instantiation::Memoized => format!(
            "const {binding} = (function () {{\n\
             let module;\n\
             return function () {{\n\
             if (module) return module.exports;\n\
             module = {{ exports: {{}} }};\n\
             (function (module, exports) {{\n\
             {body}\n\
             }})(module, module.exports);\n\
             return module.exports;\n\
             }};\n\
             }})();"
        ),
        // `module` and `exports` are parameters so the body may reassign or
        // redeclare them, e.g. `exports = module.exports = fn` or `var exports`.
        Instantiation::Reexecute => format!(
            "const {binding} = (function () {{\n\
             const module = {{ exports: {{}} }};\n\
             (function (module, exports) {{\n\
             {body}\n\
             }})(module, module.exports);\n\
             return module.exports;\n\
             }});"
        ),
    }
}

/// Drop a leading `#!` line, which is only legal at the very start of a file
pub fn strip_hashbang(source: &str) -> &str {
    if source.starts_with("#!") {
        source.find('\n').map_or("", |newline| &source[newline..])
    } else {
        source
    }
}
