//! Build orchestration
//!
//! Composes resolver, cache, graph builder, pruner and emitter for a single
//! build. Each call to [`BundleOrchestrator::bundle`] owns a fresh arena and
//! [`BuildContext`]; nothing survives between builds.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

use log::{debug, info};
use oxc_allocator::Allocator;
use tempfile::NamedTempFile;

use crate::{
    build_context::BuildContext,
    code_generator::{EmitOptions, emit},
    config::Config,
    errors::{BundleError, Result},
    graph_builder::GraphBuilder,
    resolver::{ModuleResolver, normalize_path},
};

/// Result of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOutput {
    pub code: String,
    /// Bundled module files in emission order, entry excluded
    pub modules: Vec<PathBuf>,
    /// Built-in specifiers left to the host runtime
    pub externals: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BundleOrchestrator {
    config: Config,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bundle `entry` and return the artifact text
    pub fn bundle(&self, entry: &Path) -> Result<BundleOutput> {
        let start = Instant::now();

        let entry = absolute(entry)?;
        let root = match &self.config.root {
            Some(root) => absolute(root)?,
            None => entry
                .parent()
                .map_or_else(|| PathBuf::from("/"), Path::to_path_buf),
        };
        info!(
            "Bundling {} (root {}, env '{}')",
            entry.display(),
            root.display(),
            self.config.env
        );

        let allocator = Allocator::default();
        let resolver = ModuleResolver::new(root, &self.config);
        let mut ctx = BuildContext::new(&allocator, resolver, &self.config);
        let entry_module = GraphBuilder::new(&mut ctx).build(&entry)?;

        let options = EmitOptions {
            minify: self.config.minify,
            process_shim: self.config.process_shim.then_some(self.config.env.as_str()),
        };
        let code = emit(&entry_module, ctx.graph(), ctx.rewritten(), &options)?;

        let output = BundleOutput {
            code,
            modules: ctx.graph().iter().map(|module| module.path.clone()).collect(),
            externals: ctx.externals().iter().cloned().collect(),
        };
        info!(
            "Bundled {} modules ({} files read) in {:.2?}",
            output.modules.len(),
            ctx.cache().len(),
            start.elapsed()
        );
        Ok(output)
    }

    /// Bundle `entry` and write the artifact to `output`
    ///
    /// The file is only replaced once the whole build has succeeded.
    pub fn bundle_to_file(&self, entry: &Path, output: &Path) -> Result<BundleOutput> {
        let bundle = self.bundle(entry)?;
        write_atomically(output, &bundle.code)?;
        info!("Wrote {}", output.display());
        Ok(bundle)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map(|path| normalize_path(&path))
        .map_err(|e| BundleError::io(path, e))
}

/// Write through a temporary file in the destination directory, then rename
/// it over the target
fn write_atomically(output: &Path, contents: &str) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| BundleError::io(&dir, e))?;

    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| BundleError::io(&dir, e))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| BundleError::io(temp.path(), e))?;
    temp.persist(output)
        .map_err(|e| BundleError::io(output, e.error))?;
    debug!("Persisted {} bytes to {}", contents.len(), output.display());
    Ok(())
}
