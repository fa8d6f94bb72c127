//! Template pipeline error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, loading or rendering a template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("No input file provided and no default template found in {dir} (e.g. --input wrangler.tmpl.js)")]
    NoTemplateFound { dir: PathBuf },

    #[error("Unsupported file type: {path}")]
    UnsupportedFileType { path: PathBuf },

    #[error("Failed to load template module {path}: {message}")]
    ModuleLoad { path: PathBuf, message: String },

    #[error("Failed to compile {path}: {diagnostics}")]
    Compilation { path: PathBuf, diagnostics: String },

    #[error("Template in {path} failed: {message}")]
    TemplateFailed { path: PathBuf, message: String },

    #[error("Cannot serialize configuration: {0}")]
    Serialize(String),

    #[error("Failed to write {path}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TemplateError {
    /// Create a module load error for a path
    pub fn module_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ModuleLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a compilation error for a path
    pub fn compilation(path: impl Into<PathBuf>, diagnostics: impl Into<String>) -> Self {
        Self::Compilation {
            path: path.into(),
            diagnostics: diagnostics.into(),
        }
    }

    /// Check if this error is a module load failure
    pub fn is_module_load(&self) -> bool {
        matches!(self, TemplateError::ModuleLoad { .. })
    }

    /// Check if this error is a compilation failure
    pub fn is_compilation(&self) -> bool {
        matches!(self, TemplateError::Compilation { .. })
    }

    /// Path of the template or artifact that produced this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            TemplateError::NoTemplateFound { .. } => None,
            TemplateError::UnsupportedFileType { path }
            | TemplateError::ModuleLoad { path, .. }
            | TemplateError::Compilation { path, .. }
            | TemplateError::TemplateFailed { path, .. }
            | TemplateError::Output { path, .. } => Some(path),
            TemplateError::Serialize(_) => None,
        }
    }
}

/// Failure to remove a temporary compilation directory
///
/// Never fatal: it is reported as a warning and the primary result stands.
#[derive(Debug, Error)]
#[error("Failed to remove temporary directory {path}: {source}")]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
