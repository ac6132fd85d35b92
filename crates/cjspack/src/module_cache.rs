//! Path-keyed source cache
//!
//! Keeps each file's text after the first read so a module required from
//! several call sites is read from disk once, before its content id is known.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::trace;
use rustc_hash::FxHashMap;

use crate::errors::{BundleError, Result};

#[derive(Debug, Default)]
pub struct ModuleCache {
    texts: FxHashMap<PathBuf, Arc<str>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached text for `path`, reading it through on a miss
    pub fn get_text(&mut self, path: &Path) -> Result<Arc<str>> {
        if let Some(text) = self.texts.get(path) {
            trace!("Module cache hit: {}", path.display());
            return Ok(Arc::clone(text));
        }

        trace!("Module cache miss: {}", path.display());
        let text: Arc<str> = fs::read_to_string(path)
            .map_err(|e| BundleError::io(path, e))?
            .into();
        self.texts.insert(path.to_path_buf(), Arc::clone(&text));
        Ok(text)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.texts.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
