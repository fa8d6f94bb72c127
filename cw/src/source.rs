//! Template source resolution
//!
//! Turns an optional `--input` into an absolute, classified [`TemplateSource`],
//! falling back to the default template names in the working directory.
//! Output paths are resolved independently by [`resolve_destination`].

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::TemplateError;
use crate::{DEFAULT_TEMPLATES, OUTPUT_FILENAME};

/// Extensions the runtime can load without a compile step
pub const NATIVE_EXTENSIONS: &[&str] = &["js", "cjs", "mjs"];

/// Extensions that need compiling to JavaScript first
pub const COMPILED_EXTENSIONS: &[&str] = &["ts", "mts"];

/// How a template file has to be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    NativelyLoadable,
    RequiresCompilation,
    Unsupported,
}

impl SourceKind {
    /// Classify an extension (without the leading dot)
    pub fn from_extension(ext: &str) -> Self {
        if NATIVE_EXTENSIONS.contains(&ext) {
            SourceKind::NativelyLoadable
        } else if COMPILED_EXTENSIONS.contains(&ext) {
            SourceKind::RequiresCompilation
        } else {
            SourceKind::Unsupported
        }
    }

    /// Classify a path by its extension; never touches the filesystem
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => SourceKind::Unsupported,
        }
    }
}

/// A resolved, classified template file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    path: PathBuf,
    kind: SourceKind,
}

impl TemplateSource {
    /// Classify an absolute path, rejecting unsupported extensions
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, TemplateError> {
        let path = path.into();
        let kind = SourceKind::from_path(&path);
        debug!(?path, ?kind, "TemplateSource::new: called");
        if kind == SourceKind::Unsupported {
            return Err(TemplateError::UnsupportedFileType { path });
        }
        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}

/// Resolves template paths against a working directory
#[derive(Debug, Clone)]
pub struct Resolver {
    work_dir: PathBuf,
}

impl Resolver {
    /// Create a resolver rooted at the given working directory
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        debug!(?work_dir, "Resolver::new: called");
        Self { work_dir }
    }

    /// Create a resolver rooted at the process working directory
    pub fn from_current_dir() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Resolve the template to load
    ///
    /// An explicit path is taken as-is (a missing file surfaces later as a
    /// load failure). Otherwise the default names are probed in order and the
    /// first accessible one wins.
    pub async fn resolve(&self, explicit: Option<&Path>) -> Result<TemplateSource, TemplateError> {
        debug!(?explicit, "Resolver::resolve: called");
        let candidate = match explicit {
            Some(path) => path.to_path_buf(),
            None => self.probe_defaults().await?,
        };

        let path = absolutize(&self.work_dir, &candidate);
        debug!(?path, "Resolver::resolve: normalized");
        TemplateSource::new(path)
    }

    async fn probe_defaults(&self) -> Result<PathBuf, TemplateError> {
        for name in DEFAULT_TEMPLATES {
            let candidate = self.work_dir.join(name);
            if tokio::fs::metadata(&candidate).await.is_ok() {
                debug!(%name, "Resolver::probe_defaults: found default template");
                return Ok(PathBuf::from(name));
            }
            debug!(%name, "Resolver::probe_defaults: not accessible");
        }
        Err(TemplateError::NoTemplateFound {
            dir: self.work_dir.clone(),
        })
    }
}

/// Resolve where the rendered file goes
///
/// The output may name the canonical file itself or a directory to put it
/// in. Nothing (or an empty string) means the working directory.
pub fn resolve_destination(work_dir: &Path, output: Option<&Path>) -> PathBuf {
    debug!(?work_dir, ?output, "resolve_destination: called");
    let dir = match output {
        None => PathBuf::new(),
        Some(path) if path.file_name().is_some_and(|name| name == OUTPUT_FILENAME) => {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        }
        Some(path) => path.to_path_buf(),
    };
    absolutize(work_dir, &dir.join(OUTPUT_FILENAME))
}

/// Join a relative path onto a base and normalize it lexically
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize(&joined)
}

/// Collapse `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_classification_table() {
        assert_eq!(SourceKind::from_extension("js"), SourceKind::NativelyLoadable);
        assert_eq!(SourceKind::from_extension("cjs"), SourceKind::NativelyLoadable);
        assert_eq!(SourceKind::from_extension("mjs"), SourceKind::NativelyLoadable);
        assert_eq!(SourceKind::from_extension("ts"), SourceKind::RequiresCompilation);
        assert_eq!(SourceKind::from_extension("mts"), SourceKind::RequiresCompilation);
        assert_eq!(SourceKind::from_extension("tsx"), SourceKind::Unsupported);
        assert_eq!(SourceKind::from_extension("json"), SourceKind::Unsupported);
    }

    #[test]
    fn test_classification_without_extension() {
        assert_eq!(SourceKind::from_path(Path::new("/work/template")), SourceKind::Unsupported);
        assert_eq!(
            SourceKind::from_path(Path::new("/work/wrangler.tmpl.ts")),
            SourceKind::RequiresCompilation
        );
    }

    #[test]
    fn test_template_source_rejects_unsupported() {
        let err = TemplateSource::new("/work/wrangler.tmpl.tsx").unwrap_err();
        assert!(matches!(err, TemplateError::UnsupportedFileType { .. }));
    }

    proptest! {
        #[test]
        fn prop_classification_is_pure(dir in "[a-z]{1,8}", stem in "[a-z.]{1,12}", ext in "[a-z]{1,4}") {
            // Nothing here exists on disk; the answer depends on the extension only
            let path = PathBuf::from(format!("/{dir}/{stem}.{ext}"));
            prop_assert_eq!(SourceKind::from_path(&path), SourceKind::from_extension(&ext));
            prop_assert_eq!(SourceKind::from_path(&path), SourceKind::from_path(&path));
        }
    }

    #[tokio::test]
    async fn test_resolve_explicit_relative_path() {
        let resolver = Resolver::new("/work/project");
        let source = resolver
            .resolve(Some(Path::new("./templates/../wrangler.tmpl.cjs")))
            .await
            .unwrap();

        assert_eq!(source.path(), Path::new("/work/project/wrangler.tmpl.cjs"));
        assert_eq!(source.kind(), SourceKind::NativelyLoadable);
    }

    #[tokio::test]
    async fn test_resolve_explicit_path_is_not_checked_for_existence() {
        let resolver = Resolver::new("/nonexistent");
        let source = resolver.resolve(Some(Path::new("/elsewhere/t.ts"))).await.unwrap();
        assert_eq!(source.path(), Path::new("/elsewhere/t.ts"));
    }

    #[tokio::test]
    async fn test_resolve_explicit_unsupported_fails_fast() {
        let resolver = Resolver::new("/work");
        let err = resolver.resolve(Some(Path::new("wrangler.tmpl.tsx"))).await.unwrap_err();
        assert!(matches!(err, TemplateError::UnsupportedFileType { .. }));
    }

    #[tokio::test]
    async fn test_resolve_default_only_typescript() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("wrangler.tmpl.ts"), "").unwrap();

        let source = Resolver::new(temp.path()).resolve(None).await.unwrap();
        assert_eq!(source.path(), temp.path().join("wrangler.tmpl.ts"));
        assert_eq!(source.kind(), SourceKind::RequiresCompilation);
    }

    #[tokio::test]
    async fn test_resolve_default_prefers_javascript() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("wrangler.tmpl.ts"), "").unwrap();
        std::fs::write(temp.path().join("wrangler.tmpl.js"), "").unwrap();

        let source = Resolver::new(temp.path()).resolve(None).await.unwrap();
        assert_eq!(source.path(), temp.path().join("wrangler.tmpl.js"));
        assert_eq!(source.kind(), SourceKind::NativelyLoadable);
    }

    #[tokio::test]
    async fn test_resolve_default_missing() {
        let temp = TempDir::new().unwrap();
        let err = Resolver::new(temp.path()).resolve(None).await.unwrap_err();
        assert!(matches!(err, TemplateError::NoTemplateFound { .. }));
    }

    #[test]
    fn test_destination_defaults_to_work_dir() {
        let dest = resolve_destination(Path::new("/work"), None);
        assert_eq!(dest, PathBuf::from("/work/wrangler.toml"));

        let dest = resolve_destination(Path::new("/work"), Some(Path::new("")));
        assert_eq!(dest, PathBuf::from("/work/wrangler.toml"));
    }

    #[test]
    fn test_destination_with_canonical_filename() {
        let dest = resolve_destination(Path::new("/work"), Some(Path::new("fixtures/wrangler.toml")));
        assert_eq!(dest, PathBuf::from("/work/fixtures/wrangler.toml"));

        let dest = resolve_destination(Path::new("/work"), Some(Path::new("/out/wrangler.toml")));
        assert_eq!(dest, PathBuf::from("/out/wrangler.toml"));
    }

    #[test]
    fn test_destination_directory() {
        let dest = resolve_destination(Path::new("/work"), Some(Path::new("deploy/staging")));
        assert_eq!(dest, PathBuf::from("/work/deploy/staging/wrangler.toml"));
    }

    #[test]
    fn test_normalize_parent_at_root() {
        assert_eq!(absolutize(Path::new("/"), Path::new("../a")), PathBuf::from("/a"));
        assert_eq!(absolutize(Path::new("/a/b"), Path::new("../../c")), PathBuf::from("/c"));
    }
}
