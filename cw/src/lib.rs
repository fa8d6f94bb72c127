//! create-wrangler - render wrangler.toml from an executable template
//!
//! A template is a JavaScript or TypeScript module exporting a `template`
//! function. The function receives a small capability object and returns a
//! plain configuration object, which is serialized to TOML and written next to
//! the template (or wherever `--output` points).
//!
//! # Pipeline
//!
//! ```text
//! resolve source ─► load module ─► call template ─► serialize ─► write
//!                      │
//!                      └─ .ts/.mts the runtime cannot import:
//!                         bundle into a scratch dir, load the bundle,
//!                         remove the scratch dir
//! ```
//!
//! # Modules
//!
//! - [`source`] - template discovery and path resolution
//! - [`loader`] - module loading, TypeScript compilation, scratch directories
//! - [`value`] - configuration values produced by templates
//! - [`serializer`] - TOML layout
//! - [`generate`] - the end-to-end run
//! - [`config`] - tool configuration
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod generate;
pub mod loader;
pub mod serializer;
pub mod source;
pub mod value;

pub use config::Config;
pub use error::{CleanupError, TemplateError};
pub use generate::{GenerateOptions, GenerateReport, create_config, write_output};
pub use loader::{
    CommandCompiler, CompilationJob, Compiler, EvaluatedTemplate, FnTemplate, LoadFailure, LoadedTemplate,
    ModuleLoader, NodeModuleLoader, ScratchConfig, ScratchDir, TemplateFn, TemplateLoader,
};
pub use serializer::{SerializeOptions, serialize};
pub use source::{Resolver, SourceKind, TemplateSource, resolve_destination};
pub use value::{Capabilities, ConfigTable, ConfigValue, TableStyle};

/// Template file names probed, in order, when no input is given
pub const DEFAULT_TEMPLATES: &[&str] = &["wrangler.tmpl.js", "wrangler.tmpl.ts"];

/// File name of the generated configuration
pub const OUTPUT_FILENAME: &str = "wrangler.toml";
