use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use indexmap::IndexSet;
use log::{debug, trace};
use serde::Deserialize;

use crate::{
    builtins::is_node_builtin,
    config::Config,
    errors::{BundleError, Result},
    types::ModuleKind,
};

/// Where a specifier resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocation {
    /// A source file on disk
    File {
        path: PathBuf,
        /// Directory that relative specifiers inside this module resolve against
        next_base_dir: PathBuf,
        kind: ModuleKind,
    },
    /// A module the host runtime provides instead of the filesystem
    External { specifier: String },
}

impl ResolvedLocation {
    fn file(path: PathBuf, kind: ModuleKind) -> Self {
        let next_base_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
        Self::File {
            path,
            next_base_dir,
            kind,
        }
    }

    pub fn kind(&self) -> ModuleKind {
        match self {
            Self::File { kind, .. } => *kind,
            Self::External { .. } => ModuleKind::BuiltIn,
        }
    }
}

/// The subset of `package.json` the resolver reads
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Maps `require` specifiers to files following Node's lookup rules
///
/// Relative specifiers resolve against the requiring module's directory;
/// bare specifiers resolve under `<root>/<package_dir>`. The resolver holds
/// no cache: the same inputs against the same file tree always give the
/// same answer.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    root: PathBuf,
    package_dir: String,
    extension: String,
    externals: IndexSet<String>,
}

impl ModuleResolver {
    pub fn new(root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            root: normalize_path(&root.into()),
            package_dir: config.package_dir.clone(),
            extension: config.extension.clone(),
            externals: config.externals.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `specifier` as written in a module whose directory is `base_dir`
    pub fn resolve(&self, specifier: &str, base_dir: &Path) -> Result<ResolvedLocation> {
        trace!("Resolving '{specifier}' from {}", base_dir.display());

        let resolved = if is_relative_specifier(specifier) {
            self.resolve_relative(specifier, base_dir)?
        } else {
            self.resolve_package(specifier)?
        };

        match resolved {
            Some(location) => {
                debug!("Resolved '{specifier}' -> {location:?}");
                Ok(location)
            }
            None => Err(BundleError::Resolution {
                specifier: specifier.to_owned(),
                base_dir: base_dir.to_path_buf(),
            }),
        }
    }

    fn resolve_relative(
        &self,
        specifier: &str,
        base_dir: &Path,
    ) -> Result<Option<ResolvedLocation>> {
        let target = normalize_path(&base_dir.join(specifier));
        let candidate = self.with_default_extension(&target);
        if candidate.is_file() {
            return Ok(Some(ResolvedLocation::file(candidate, ModuleKind::Project)));
        }

        // `./lib` may name a directory with its own index or manifest
        if target.is_dir() {
            return Ok(self
                .resolve_directory(&target)?
                .map(|path| ResolvedLocation::file(path, ModuleKind::Project)));
        }

        Ok(None)
    }

    fn resolve_package(&self, specifier: &str) -> Result<Option<ResolvedLocation>> {
        let package_path = normalize_path(&self.root.join(&self.package_dir).join(specifier));

        // a. Installed package directory: follow its manifest
        if package_path.is_dir()
            && let Some(main) = self.resolve_directory(&package_path)?
        {
            return Ok(Some(ResolvedLocation::file(main, ModuleKind::Package)));
        }

        // b. Exact file inside the package directory
        if package_path.is_file() {
            return Ok(Some(ResolvedLocation::file(
                package_path,
                ModuleKind::Package,
            )));
        }

        // c. File with the default extension appended
        let with_extension = append_extension(&package_path, &self.extension);
        if with_extension.is_file() {
            return Ok(Some(ResolvedLocation::file(
                with_extension,
                ModuleKind::Package,
            )));
        }

        // d. Host built-in
        if is_node_builtin(specifier) || self.externals.contains(specifier) {
            return Ok(Some(ResolvedLocation::External {
                specifier: specifier.to_owned(),
            }));
        }

        Ok(None)
    }

    /// Resolve a package directory to its entry file via `package.json` `main`,
    /// falling back to `index.<ext>`
    fn resolve_directory(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let index = format!("index.{}", self.extension);
        let main = read_manifest(&dir.join("package.json"))?
            .and_then(|manifest| manifest.main)
            .filter(|main| !main.is_empty());

        let Some(main) = main else {
            let index_path = dir.join(index);
            return Ok(index_path.is_file().then_some(index_path));
        };

        let main_path = normalize_path(&dir.join(&main));
        if main_path.is_file() {
            return Ok(Some(main_path));
        }
        let with_extension = append_extension(&main_path, &self.extension);
        if with_extension.is_file() {
            return Ok(Some(with_extension));
        }
        let nested_index = main_path.join(index);
        if nested_index.is_file() {
            return Ok(Some(nested_index));
        }

        debug!(
            "Package {} declares main '{main}' but no such file exists",
            dir.display()
        );
        Ok(None)
    }

    /// Append the default extension unless the path already carries one
    fn with_default_extension(&self, path: &Path) -> PathBuf {
        if path.extension().is_some() && path.is_file() {
            return path.to_path_buf();
        }
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
        {
            return path.to_path_buf();
        }
        append_extension(path, &self.extension)
    }
}

/// `./x` and `../y` resolve against the requiring module's directory
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".");
    os.push(extension);
    PathBuf::from(os)
}

/// Missing manifests are fine; malformed ones are not
fn read_manifest(path: &Path) -> Result<Option<PackageManifest>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            trace!("No readable manifest at {}: {e}", path.display());
            return Ok(None);
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| BundleError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Lexically normalize `.` and `..` components without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn create_test_file(path: &Path, content: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    }

    fn resolver_for(root: &Path) -> ModuleResolver {
        ModuleResolver::new(root, &Config::default())
    }

    fn resolved_file(location: ResolvedLocation) -> (PathBuf, PathBuf) {
        match location {
            ResolvedLocation::File {
                path,
                next_base_dir,
                ..
            } => (path, next_base_dir),
            ResolvedLocation::External { specifier } => {
                panic!("expected a file, got external '{specifier}'")
            }
        }
    }

    #[test]
    fn test_relative_default_extension() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("a/b/x.js"), "module.exports = 1;")?;

        let resolver = resolver_for(root);
        let (path, next_base_dir) = resolved_file(resolver.resolve("./x", &root.join("a/b"))?);

        assert_eq!(path, root.join("a/b/x.js"));
        assert_eq!(next_base_dir, root.join("a/b"));
        Ok(())
    }

    #[test]
    fn test_relative_missing_file_fails() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        let base = root.join("a/b");
        fs::create_dir_all(&base)?;

        let err = resolver_for(root)
            .resolve("./x", &base)
            .expect_err("missing module must not resolve");
        match err {
            BundleError::Resolution {
                specifier,
                base_dir,
            } => {
                assert_eq!(specifier, "./x");
                assert_eq!(base_dir, base);
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_relative_parent_and_explicit_extension() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("shared/util.js"), "")?;
        create_test_file(&root.join("shared/data.config.js"), "")?;

        let resolver = resolver_for(root);
        let base = root.join("src/nested");
        fs::create_dir_all(&base)?;

        let (path, _) = resolved_file(resolver.resolve("../../shared/util.js", &base)?);
        assert_eq!(path, root.join("shared/util.js"));

        // `.config` is not the default extension, so `.js` is still appended
        let (path, _) = resolved_file(resolver.resolve("../../shared/data.config", &base)?);
        assert_eq!(path, root.join("shared/data.config.js"));
        Ok(())
    }

    #[test]
    fn test_relative_directory_index() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("lib/index.js"), "")?;

        let (path, next_base_dir) = resolved_file(resolver_for(root).resolve("./lib", root)?);
        assert_eq!(path, root.join("lib/index.js"));
        assert_eq!(next_base_dir, root.join("lib"));
        Ok(())
    }

    #[test]
    fn test_package_main_from_manifest() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(
            &root.join("node_modules/pkg/package.json"),
            r#"{ "name": "pkg", "main": "lib/entry.js" }"#,
        )?;
        create_test_file(&root.join("node_modules/pkg/lib/entry.js"), "")?;

        // The base directory of the requiring module does not matter for packages
        let base = root.join("src/deep");
        let (path, next_base_dir) = resolved_file(resolver_for(root).resolve("pkg", &base)?);

        assert_eq!(path, root.join("node_modules/pkg/lib/entry.js"));
        assert_eq!(next_base_dir, root.join("node_modules/pkg/lib"));
        Ok(())
    }

    #[test]
    fn test_package_defaults_to_index() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("node_modules/plain/index.js"), "")?;
        create_test_file(
            &root.join("node_modules/nomain/package.json"),
            r#"{ "name": "nomain" }"#,
        )?;
        create_test_file(&root.join("node_modules/nomain/index.js"), "")?;
        create_test_file(
            &root.join("node_modules/extless/package.json"),
            r#"{ "main": "dist/main" }"#,
        )?;
        create_test_file(&root.join("node_modules/extless/dist/main.js"), "")?;

        let resolver = resolver_for(root);
        let (path, _) = resolved_file(resolver.resolve("plain", root)?);
        assert_eq!(path, root.join("node_modules/plain/index.js"));
        let (path, _) = resolved_file(resolver.resolve("nomain", root)?);
        assert_eq!(path, root.join("node_modules/nomain/index.js"));
        let (path, _) = resolved_file(resolver.resolve("extless", root)?);
        assert_eq!(path, root.join("node_modules/extless/dist/main.js"));
        Ok(())
    }

    #[test]
    fn test_package_subpath_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("node_modules/pkg/lib/util.js"), "")?;
        create_test_file(&root.join("node_modules/single.js"), "")?;

        let resolver = resolver_for(root);
        let (path, next_base_dir) = resolved_file(resolver.resolve("pkg/lib/util", root)?);
        assert_eq!(path, root.join("node_modules/pkg/lib/util.js"));
        assert_eq!(next_base_dir, root.join("node_modules/pkg/lib"));

        let (path, _) = resolved_file(resolver.resolve("pkg/lib/util.js", root)?);
        assert_eq!(path, root.join("node_modules/pkg/lib/util.js"));

        let (path, _) = resolved_file(resolver.resolve("single", root)?);
        assert_eq!(path, root.join("node_modules/single.js"));
        Ok(())
    }

    #[test]
    fn test_builtins_and_externals() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        let config = Config {
            externals: IndexSet::from(["electron".to_owned()]),
            ..Config::default()
        };
        let resolver = ModuleResolver::new(root, &config);

        assert_eq!(
            resolver.resolve("fs", root)?,
            ResolvedLocation::External {
                specifier: "fs".to_owned()
            }
        );
        assert_eq!(resolver.resolve("electron", root)?.kind(), ModuleKind::BuiltIn);
        assert!(resolver.resolve("left-pad", root).is_err());
        Ok(())
    }

    #[test]
    fn test_installed_package_shadows_builtin() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("node_modules/events/index.js"), "")?;

        let location = resolver_for(root).resolve("events", root)?;
        assert_eq!(location.kind(), ModuleKind::Package);
        Ok(())
    }

    #[test]
    fn test_malformed_manifest_is_an_error() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("node_modules/broken/package.json"), "{ main: ")?;

        let err = resolver_for(root)
            .resolve("broken", root)
            .expect_err("malformed manifest");
        assert!(matches!(err, BundleError::Manifest { .. }));
        Ok(())
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/./c/../d.js")),
            PathBuf::from("/a/b/d.js")
        );
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }
}
