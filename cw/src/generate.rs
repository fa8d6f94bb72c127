//! End-to-end generation: resolve, load, render, serialize, write

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TemplateError;
use crate::loader::TemplateLoader;
use crate::serializer::{SerializeOptions, serialize};
use crate::source::{Resolver, resolve_destination};
use crate::value::Capabilities;

/// Inputs of one generation run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Template path; the default names are probed when absent
    pub input: Option<PathBuf>,

    /// Output file or directory; the working directory when absent
    pub output: Option<PathBuf>,

    /// Directory relative paths are resolved against
    pub work_dir: PathBuf,

    /// Serializer formatting
    pub serialize: SerializeOptions,
}

impl GenerateOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: None,
            output: None,
            work_dir: work_dir.into(),
            serialize: SerializeOptions::default(),
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl fmt::Display for GenerateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parsed {} to {}", self.source.display(), self.destination.display())
    }
}

/// Render a template into its destination file
pub async fn create_config(options: &GenerateOptions, loader: &TemplateLoader) -> Result<GenerateReport, TemplateError> {
    debug!(?options, "create_config: called");

    let resolver = Resolver::new(&options.work_dir);
    let source = resolver.resolve(options.input.as_deref()).await?;
    let destination = resolve_destination(&options.work_dir, options.output.as_deref());
    debug!("Rendering {} to {}", source.path().display(), destination.display());

    let template = loader.load(&source).await?;
    let config = template.render(&Capabilities).await?;
    let content = serialize(&config, &options.serialize)?;
    write_output(&destination, &content).await?;

    Ok(GenerateReport {
        source: source.path().to_path_buf(),
        destination,
    })
}

/// Write the rendered file, creating parent directories as needed
pub async fn write_output(path: &Path, content: &str) -> Result<(), TemplateError> {
    debug!(?path, bytes = content.len(), "write_output: called");
    let to_error = |source: std::io::Error| TemplateError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
    }
    tokio::fs::write(path, content).await.map_err(to_error)?;
    Ok(())
}
