//! Template loading
//!
//! A [`TemplateSource`](crate::source::TemplateSource) is turned into a
//! [`LoadedTemplate`] by the [`TemplateLoader`] pipeline. The two outside
//! collaborators sit behind traits:
//!
//! - [`ModuleLoader`] executes a module and retrieves its `template` export
//! - [`Compiler`] bundles TypeScript into a loadable module
//!
//! The process-backed implementations are [`NodeModuleLoader`] and
//! [`CommandCompiler`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::TemplateError;
use crate::value::{Capabilities, ConfigValue};

mod compiler;
mod node;
mod pipeline;
mod scratch;

pub use compiler::CommandCompiler;
pub use node::{NodeModuleLoader, UNINTERPRETABLE_CODES};
pub use pipeline::TemplateLoader;
pub use scratch::{ScratchConfig, ScratchDir};

/// Why a module could not be loaded
#[derive(Debug)]
pub enum LoadFailure {
    /// The runtime cannot interpret this kind of file directly
    Uninterpretable { code: String },
    /// Anything else; compiling would only reproduce it
    Failed(TemplateError),
}

impl LoadFailure {
    /// Collapse into a hard error for paths that have no compile fallback
    pub fn into_error(self, path: &Path) -> TemplateError {
        match self {
            LoadFailure::Failed(err) => err,
            LoadFailure::Uninterpretable { code } => {
                TemplateError::module_load(path, format!("runtime cannot load this file ({})", code))
            }
        }
    }
}

impl From<TemplateError> for LoadFailure {
    fn from(err: TemplateError) -> Self {
        LoadFailure::Failed(err)
    }
}

/// Executes user modules and retrieves their `template` function
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the module at `path`
    ///
    /// A module without a callable `template` export is a
    /// [`TemplateError::ModuleLoad`], never a default.
    async fn load_template_function(&self, path: &Path) -> Result<Box<dyn TemplateFn>, LoadFailure>;
}

/// Bundles a higher-level source file into a loadable module
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Compile `job.source_path()` into `job.output_dir()`
    ///
    /// On success the artifact must exist at [`CompilationJob::artifact_path`].
    async fn compile(&self, job: &CompilationJob) -> Result<(), TemplateError>;
}

/// A template function retrieved from a module
#[async_trait]
pub trait TemplateFn: Send + Sync {
    async fn call(&self, caps: &Capabilities) -> Result<ConfigValue, TemplateError>;
}

/// A template whose output was captured when its module was evaluated
///
/// Process-backed runtimes evaluate `template` while the module file still
/// exists, so the result outlives any temporary compilation output.
#[derive(Debug, Clone)]
pub struct EvaluatedTemplate {
    value: ConfigValue,
}

impl EvaluatedTemplate {
    pub fn new(value: ConfigValue) -> Self {
        Self { value }
    }
}

#[async_trait]
impl TemplateFn for EvaluatedTemplate {
    async fn call(&self, _caps: &Capabilities) -> Result<ConfigValue, TemplateError> {
        Ok(self.value.clone())
    }
}

/// A template implemented in Rust
pub struct FnTemplate<F>(pub F);

#[async_trait]
impl<F> TemplateFn for FnTemplate<F>
where
    F: Fn(&Capabilities) -> Result<ConfigValue, TemplateError> + Send + Sync,
{
    async fn call(&self, caps: &Capabilities) -> Result<ConfigValue, TemplateError> {
        (self.0)(caps)
    }
}

/// A successfully loaded template module
pub struct LoadedTemplate {
    source: PathBuf,
    func: Box<dyn TemplateFn>,
}

impl LoadedTemplate {
    pub fn new(source: impl Into<PathBuf>, func: Box<dyn TemplateFn>) -> Self {
        Self {
            source: source.into(),
            func,
        }
    }

    /// The template source this was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Invoke `template` with the capability object
    pub async fn render(&self, caps: &Capabilities) -> Result<ConfigValue, TemplateError> {
        debug!(source = ?self.source, "LoadedTemplate::render: called");
        self.func.call(caps).await
    }
}

impl std::fmt::Debug for LoadedTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedTemplate").field("source", &self.source).finish()
    }
}

/// One attempt at compiling a template
#[derive(Debug, Clone)]
pub struct CompilationJob {
    source_path: PathBuf,
    output_dir: PathBuf,
    compiled_path: Option<PathBuf>,
}

impl CompilationJob {
    pub fn new(source_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            output_dir: output_dir.into(),
            compiled_path: None,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the bundler writes the module: the source's base name with `.js`
    pub fn artifact_path(&self) -> PathBuf {
        let mut name = self
            .source_path
            .file_stem()
            .map(|stem| stem.to_os_string())
            .unwrap_or_default();
        name.push(".js");
        self.output_dir.join(name)
    }

    /// The compiled module, once the compiler has succeeded
    pub fn compiled_path(&self) -> Option<&Path> {
        self.compiled_path.as_deref()
    }

    pub(crate) fn mark_compiled(&mut self) -> PathBuf {
        let artifact = self.artifact_path();
        self.compiled_path = Some(artifact.clone());
        artifact
    }
}
