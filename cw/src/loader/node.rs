//! Module loading through a JavaScript runtime process

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::{EvaluatedTemplate, LoadFailure, ModuleLoader, TemplateFn};
use crate::config::RuntimeConfig;
use crate::error::TemplateError;
use crate::value::ConfigValue;

/// Loader script run by the runtime (`--input-type=module -e`)
const BOOTSTRAP: &str = include_str!("bootstrap.mjs");

/// Prefix of the report line the loader script writes to stdout
const REPORT_MARKER: &str = "@@create-wrangler-report@@";

/// Runtime error codes meaning "this file type cannot be imported directly"
pub const UNINTERPRETABLE_CODES: &[&str] = &[
    "ERR_UNKNOWN_FILE_EXTENSION",
    "ERR_UNSUPPORTED_DIR_IMPORT",
    "ERR_UNSUPPORTED_TYPESCRIPT_SYNTAX",
];

/// Where in the loader script a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum FailureStage {
    Import,
    Export,
    Call,
    Encode,
}

/// The report line written by the loader script
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
enum RuntimeReport {
    Loaded {
        value: ConfigValue,
    },
    Failed {
        stage: FailureStage,
        #[serde(default)]
        code: Option<String>,
        message: String,
    },
}

/// Loads template modules by running them in `node` (or a compatible runtime)
///
/// The module is imported, `template` is called and its result is encoded in
/// the same process, so the returned [`TemplateFn`] holds the evaluated
/// configuration.
#[derive(Debug, Clone)]
pub struct NodeModuleLoader {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
}

impl NodeModuleLoader {
    pub fn new(program: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: work_dir.into(),
        }
    }

    pub fn from_config(config: &RuntimeConfig, work_dir: &Path) -> Self {
        debug!(?config, "NodeModuleLoader::from_config: called");
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            work_dir: work_dir.to_path_buf(),
        }
    }

    fn interpret(&self, path: &Path, report: RuntimeReport) -> Result<Box<dyn TemplateFn>, LoadFailure> {
        match report {
            RuntimeReport::Loaded { value } => {
                debug!("NodeModuleLoader::interpret: loaded");
                Ok(Box::new(EvaluatedTemplate::new(value)))
            }
            RuntimeReport::Failed { stage, code, message } => {
                debug!(?stage, ?code, "NodeModuleLoader::interpret: failed");
                Err(classify(path, stage, code, message))
            }
        }
    }
}

fn classify(path: &Path, stage: FailureStage, code: Option<String>, message: String) -> LoadFailure {
    match (stage, code) {
        (FailureStage::Import, Some(code)) if UNINTERPRETABLE_CODES.contains(&code.as_str()) => {
            LoadFailure::Uninterpretable { code }
        }
        (FailureStage::Import | FailureStage::Export, _) => {
            LoadFailure::Failed(TemplateError::module_load(path, message))
        }
        (FailureStage::Call | FailureStage::Encode, _) => LoadFailure::Failed(TemplateError::TemplateFailed {
            path: path.to_path_buf(),
            message,
        }),
    }
}

/// Find the report line, logging everything else the template printed
fn extract_report(stdout: &str) -> Option<&str> {
    let mut report = None;
    for line in stdout.lines() {
        match line.strip_prefix(REPORT_MARKER) {
            Some(json) => report = Some(json),
            None => debug!(target: "template", "{}", line),
        }
    }
    report
}

#[async_trait]
impl ModuleLoader for NodeModuleLoader {
    async fn load_template_function(&self, path: &Path) -> Result<Box<dyn TemplateFn>, LoadFailure> {
        debug!(?path, program = %self.program, "NodeModuleLoader::load_template_function: called");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--input-type=module")
            .arg("-e")
            .arg(BOOTSTRAP)
            .arg(path)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| TemplateError::module_load(path, format!("failed to start {}: {}", self.program, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!(target: "template", "{}", line);
        }

        let Some(json) = extract_report(&stdout) else {
            debug!(status = %output.status, "NodeModuleLoader::load_template_function: no report");
            let detail = stderr.trim();
            let message = if detail.is_empty() {
                format!("{} exited with {} without loading the module", self.program, output.status)
            } else {
                detail.to_string()
            };
            return Err(TemplateError::module_load(path, message).into());
        };

        let report: RuntimeReport = serde_json::from_str(json)
            .map_err(|e| TemplateError::module_load(path, format!("unreadable runtime report: {}", e)))?;
        self.interpret(path, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Capabilities;

    fn report(json: &str) -> RuntimeReport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_bootstrap_uses_the_same_marker() {
        assert!(BOOTSTRAP.contains(REPORT_MARKER));
    }

    #[test]
    fn test_extract_report_ignores_template_output() {
        let stdout = format!("hello from template\n{}{{\"status\":\"loaded\"}}\n", REPORT_MARKER);
        assert_eq!(extract_report(&stdout), Some("{\"status\":\"loaded\"}"));
        assert_eq!(extract_report("just logs\n"), None);
    }

    #[tokio::test]
    async fn test_loaded_report_becomes_template() {
        let loader = NodeModuleLoader::new("node", "/work");
        let parsed = report(
            r#"{"status":"loaded","value":{"type":"table","value":{"style":"plain","entries":[["name",{"type":"string","value":"x"}]]}}}"#,
        );

        let func = loader.interpret(Path::new("/work/a.js"), parsed).unwrap();
        let value = func.call(&Capabilities).await.unwrap();
        assert_eq!(value.as_table().unwrap().get("name"), Some(&ConfigValue::from("x")));
    }

    #[tokio::test]
    async fn test_loaded_report_keeps_pinned_number_types() {
        let loader = NodeModuleLoader::new("node", "/work");
        let parsed = report(
            r#"{"status":"loaded","value":{"type":"table","value":{"style":"plain","entries":[["ratio",{"type":"float","value":1}],["big",{"type":"integer","value":"-9223372036854775808"}]]}}}"#,
        );

        let func = loader.interpret(Path::new("/work/a.js"), parsed).unwrap();
        let value = func.call(&Capabilities).await.unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.get("ratio"), Some(&ConfigValue::Float(1.0)));
        assert_eq!(table.get("big"), Some(&ConfigValue::Integer(i64::MIN)));
    }

    #[test]
    fn test_bootstrap_offers_number_helpers() {
        assert!(BOOTSTRAP.contains("Integer,"));
        assert!(BOOTSTRAP.contains("Float,"));
    }

    #[test]
    fn test_unknown_extension_is_uninterpretable() {
        let parsed = report(
            r#"{"status":"failed","stage":"import","code":"ERR_UNKNOWN_FILE_EXTENSION","message":"Unknown file extension \".ts\""}"#,
        );
        let loader = NodeModuleLoader::new("node", "/work");
        let failure = loader.interpret(Path::new("/work/a.ts"), parsed).err().unwrap();
        assert!(matches!(failure, LoadFailure::Uninterpretable { code } if code == "ERR_UNKNOWN_FILE_EXTENSION"));
    }

    #[test]
    fn test_syntax_error_is_not_uninterpretable() {
        let failure = classify(
            Path::new("/work/a.ts"),
            FailureStage::Import,
            None,
            "SyntaxError: Unexpected token".to_string(),
        );
        assert!(matches!(failure, LoadFailure::Failed(TemplateError::ModuleLoad { .. })));
    }

    #[test]
    fn test_recognized_code_outside_import_is_not_uninterpretable() {
        let failure = classify(
            Path::new("/work/a.ts"),
            FailureStage::Call,
            Some("ERR_UNKNOWN_FILE_EXTENSION".to_string()),
            "boom".to_string(),
        );
        assert!(matches!(failure, LoadFailure::Failed(TemplateError::TemplateFailed { .. })));
    }

    #[test]
    fn test_missing_export_is_module_load() {
        let parsed = report(r#"{"status":"failed","stage":"export","message":"must export a function named \"template\""}"#);
        let loader = NodeModuleLoader::new("node", "/work");
        let failure = loader.interpret(Path::new("/work/a.js"), parsed).err().unwrap();
        match failure {
            LoadFailure::Failed(err) => {
                assert!(err.is_module_load());
                assert_eq!(err.path(), Some(&PathBuf::from("/work/a.js")));
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_runtime_is_module_load() {
        let loader = NodeModuleLoader::new("create-wrangler-no-such-runtime", std::env::temp_dir());
        let failure = loader
            .load_template_function(Path::new("/work/a.js"))
            .await
            .err()
            .unwrap();
        match failure {
            LoadFailure::Failed(err) => assert!(err.to_string().contains("failed to start")),
            other => panic!("unexpected failure: {:?}", other),
        }
    }
}
