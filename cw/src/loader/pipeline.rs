//! The load-or-compile pipeline
//!
//! ```text
//! NativelyLoadable     ──► Direct ─────────────────────────────► LoadedTemplate
//! RequiresCompilation  ──► OptimisticLoad ──ok───────────────────► LoadedTemplate
//!                               │ uninterpretable
//!                               ▼
//!                           Compile ──► load artifact ──► Cleanup ──► result
//! ```
//!
//! Every path through Compile goes through Cleanup, which removes the
//! per-run output directory before the carried result is returned.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    CommandCompiler, CompilationJob, Compiler, LoadFailure, LoadedTemplate, ModuleLoader, NodeModuleLoader,
    ScratchConfig, ScratchDir, TemplateFn,
};
use crate::config::Config;
use crate::error::TemplateError;
use crate::source::{SourceKind, TemplateSource};

/// Loads template sources, compiling them first when the runtime cannot
pub struct TemplateLoader {
    modules: Arc<dyn ModuleLoader>,
    compiler: Arc<dyn Compiler>,
    scratch: ScratchConfig,
}

impl TemplateLoader {
    pub fn new(modules: Arc<dyn ModuleLoader>, compiler: Arc<dyn Compiler>, scratch: ScratchConfig) -> Self {
        debug!(?scratch, "TemplateLoader::new: called");
        Self {
            modules,
            compiler,
            scratch,
        }
    }

    /// Build the process-backed loader described by the configuration
    pub fn from_config(config: &Config, work_dir: &Path) -> Self {
        debug!(?work_dir, "TemplateLoader::from_config: called");
        Self::new(
            Arc::new(NodeModuleLoader::from_config(&config.runtime, work_dir)),
            Arc::new(CommandCompiler::from_config(&config.compiler, work_dir)),
            ScratchConfig::from_config(&config.workspace, work_dir),
        )
    }

    /// Load a template source
    pub async fn load(&self, source: &TemplateSource) -> Result<LoadedTemplate, TemplateError> {
        let path = source.path();
        debug!(?path, kind = ?source.kind(), "TemplateLoader::load: called");

        match source.kind() {
            SourceKind::Unsupported => Err(TemplateError::UnsupportedFileType {
                path: path.to_path_buf(),
            }),
            SourceKind::NativelyLoadable => {
                let func = self
                    .modules
                    .load_template_function(path)
                    .await
                    .map_err(|failure| failure.into_error(path))?;
                Ok(LoadedTemplate::new(path, func))
            }
            SourceKind::RequiresCompilation => match self.modules.load_template_function(path).await {
                Ok(func) => {
                    debug!("TemplateLoader::load: runtime loaded source directly");
                    Ok(LoadedTemplate::new(path, func))
                }
                Err(LoadFailure::Uninterpretable { code }) => {
                    debug!(%code, "TemplateLoader::load: falling back to compilation");
                    self.compile_and_load(path).await
                }
                Err(LoadFailure::Failed(err)) => Err(err),
            },
        }
    }

    async fn compile_and_load(&self, source: &Path) -> Result<LoadedTemplate, TemplateError> {
        info!("Compiling TypeScript template {}...", source.display());

        let scratch = ScratchDir::create(&self.scratch).await.map_err(|e| {
            TemplateError::compilation(source, format!("failed to create output directory: {}", e))
        })?;

        let mut job = CompilationJob::new(source, scratch.path());
        let result = self.run_job(&mut job).await;

        if let Err(e) = scratch.cleanup().await {
            warn!("{}", e);
        }

        result.map(|func| LoadedTemplate::new(source, func))
    }

    async fn run_job(&self, job: &mut CompilationJob) -> Result<Box<dyn TemplateFn>, TemplateError> {
        self.compiler.compile(job).await?;
        let artifact = job.mark_compiled();
        debug!(?artifact, "TemplateLoader::run_job: compiled");

        self.modules
            .load_template_function(&artifact)
            .await
            .map_err(|failure| attribute_to_source(failure.into_error(&artifact), job.source_path()))
    }
}

/// Report artifact failures against the source; the artifact is about to be deleted
fn attribute_to_source(err: TemplateError, source: &Path) -> TemplateError {
    match err {
        TemplateError::ModuleLoad { path, message } => TemplateError::ModuleLoad {
            path: source.to_path_buf(),
            message: format!("{} (compiled to {})", message, path.display()),
        },
        TemplateError::TemplateFailed { message, .. } => TemplateError::TemplateFailed {
            path: source.to_path_buf(),
            message,
        },
        other => other,
    }
}
