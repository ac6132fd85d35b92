//! Host built-in module detection
//!
//! Single source of truth for deciding whether a bare specifier names a
//! module the host runtime provides (e.g. `fs`, `node:path`) rather than a
//! file on disk.

/// Core modules shipped with Node.js
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Check if a specifier names a Node.js core module
///
/// Handles the `node:` scheme prefix and sub-path specifiers such as
/// `fs/promises` or `path/posix`.
pub fn is_node_builtin(specifier: &str) -> bool {
    let name = specifier.strip_prefix("node:").unwrap_or(specifier);
    let top_level = name.split('/').next().unwrap_or(name);
    NODE_BUILTINS.binary_search(&top_level).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_list_is_sorted() {
        assert!(NODE_BUILTINS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_is_node_builtin() {
        assert!(is_node_builtin("fs"));
        assert!(is_node_builtin("node:path"));
        assert!(is_node_builtin("fs/promises"));
        assert!(!is_node_builtin("react"));
        assert!(!is_node_builtin("./fs"));
    }
}
