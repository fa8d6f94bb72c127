//! TOML serialization of template output
//!
//! Scalars, keys, arrays and inline tables are encoded by `toml_edit`; this
//! module only decides the layout:
//!
//! - key/value records of a table come before its sections
//! - plain nested tables flatten into dotted keys (`vars.LOG_LEVEL = "warn"`)
//! - section tables get a `[path]` header, arrays of sections `[[path]]`
//! - records inside a section are indented one level per section depth
//! - a blank line goes before every section when `newline_around_section` is set

use toml_edit::{Array, InlineTable, Key, Value};
use tracing::debug;

use crate::error::TemplateError;
use crate::value::{ConfigTable, ConfigValue, TableStyle};

/// Formatting options for [`serialize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Indentation unit for one level of section nesting
    pub indent: String,
    /// Record separator
    pub newline: String,
    /// Put a blank line before each section header
    pub newline_around_section: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
            newline: "\n".to_string(),
            newline_around_section: true,
        }
    }
}

/// Serialize a configuration value as TOML text, trimmed of surrounding whitespace
pub fn serialize(value: &ConfigValue, options: &SerializeOptions) -> Result<String, TemplateError> {
    debug!(?options, "serialize: called");
    let root = match value {
        ConfigValue::Table(table) => table,
        other => {
            return Err(TemplateError::Serialize(format!(
                "template must return a table, got {}",
                other.kind()
            )));
        }
    };

    let mut writer = Writer {
        options,
        lines: Vec::new(),
    };
    writer.write_body(root, &[], 0, 0)?;

    let text = writer.lines.join(&options.newline);
    Ok(text.trim().to_string())
}

/// A record or section found while flattening a table
enum Entry<'a> {
    Pair(Vec<&'a str>, Value),
    Section(Vec<&'a str>, &'a ConfigTable),
    SectionArray(Vec<&'a str>, Vec<&'a ConfigTable>),
}

struct Writer<'o> {
    options: &'o SerializeOptions,
    lines: Vec<String>,
}

impl Writer<'_> {
    fn write_body<'a>(
        &mut self,
        table: &'a ConfigTable,
        path: &[&'a str],
        pair_depth: usize,
        section_depth: usize,
    ) -> Result<(), TemplateError> {
        let mut pairs = Vec::new();
        let mut sections = Vec::new();
        collect(table, &mut Vec::new(), &mut pairs, &mut sections)?;

        for entry in pairs {
            if let Entry::Pair(keys, value) = entry {
                let line = format!("{}{} = {}", self.indent(pair_depth), dotted(&keys), value);
                self.lines.push(line);
            }
        }

        for entry in sections {
            match entry {
                Entry::Section(keys, child) => {
                    let full = join_path(path, &keys);
                    self.open_section(format!("[{}]", dotted(&full)), section_depth);
                    self.write_body(child, &full, section_depth + 1, section_depth + 1)?;
                }
                Entry::SectionArray(keys, children) => {
                    let full = join_path(path, &keys);
                    for child in children {
                        self.open_section(format!("[[{}]]", dotted(&full)), section_depth);
                        self.write_body(child, &full, section_depth + 1, section_depth + 1)?;
                    }
                }
                Entry::Pair(..) => {}
            }
        }
        Ok(())
    }

    fn open_section(&mut self, header: String, depth: usize) {
        if self.options.newline_around_section {
            self.lines.push(String::new());
        }
        let line = format!("{}{}", self.indent(depth), header);
        self.lines.push(line);
    }

    fn indent(&self, depth: usize) -> String {
        self.options.indent.repeat(depth)
    }
}

/// Flatten a table into dotted records and the sections below it
fn collect<'a>(
    table: &'a ConfigTable,
    prefix: &mut Vec<&'a str>,
    pairs: &mut Vec<Entry<'a>>,
    sections: &mut Vec<Entry<'a>>,
) -> Result<(), TemplateError> {
    for (key, value) in &table.entries {
        prefix.push(key.as_str());
        match value {
            ConfigValue::Table(child) if child.style == TableStyle::Section => {
                sections.push(Entry::Section(prefix.clone(), child));
            }
            ConfigValue::Table(child) if child.style == TableStyle::Plain && !child.is_empty() => {
                collect(child, prefix, pairs, sections)?;
            }
            ConfigValue::Array(items) if !items.is_empty() && items.iter().any(ConfigValue::is_section) => {
                let tables: Vec<&ConfigTable> = items
                    .iter()
                    .filter_map(|item| item.as_table().filter(|t| t.is_section()))
                    .collect();
                if tables.len() != items.len() {
                    return Err(TemplateError::Serialize(format!(
                        "array {} mixes sections with other values",
                        dotted(prefix)
                    )));
                }
                sections.push(Entry::SectionArray(prefix.clone(), tables));
            }
            other => {
                let inline = to_inline(other, prefix)?;
                pairs.push(Entry::Pair(prefix.clone(), inline));
            }
        }
        prefix.pop();
    }
    Ok(())
}

/// Encode a value that has to fit on one line
fn to_inline(value: &ConfigValue, path: &[&str]) -> Result<Value, TemplateError> {
    let encoded = match value {
        ConfigValue::String(s) => Value::from(s.as_str()),
        ConfigValue::Integer(i) => Value::from(*i),
        ConfigValue::Float(f) => Value::from(*f),
        ConfigValue::Boolean(b) => Value::from(*b),
        ConfigValue::Datetime(text) => {
            let datetime: toml_edit::Datetime = text.parse().map_err(|e| {
                TemplateError::Serialize(format!("invalid datetime {:?} at {}: {}", text, dotted(path), e))
            })?;
            Value::from(datetime)
        }
        ConfigValue::Array(items) => {
            let mut array = Array::new();
            for item in items {
                array.push(to_inline(item, path)?);
            }
            Value::Array(array)
        }
        ConfigValue::Table(table) if table.is_section() => {
            return Err(TemplateError::Serialize(format!(
                "section at {} cannot be written inline",
                dotted(path)
            )));
        }
        ConfigValue::Table(table) => {
            let mut inline = InlineTable::new();
            let mut child_path = path.to_vec();
            for (key, child) in &table.entries {
                child_path.push(key.as_str());
                inline.insert(key.as_str(), to_inline(child, &child_path)?);
                child_path.pop();
            }
            Value::InlineTable(inline)
        }
    };
    Ok(encoded)
}

fn join_path<'a>(path: &[&'a str], keys: &[&'a str]) -> Vec<&'a str> {
    path.iter().chain(keys.iter()).copied().collect()
}

fn dotted(keys: &[&str]) -> String {
    keys.iter()
        .map(|key| Key::new(*key).to_string())
        .collect::<Vec<_>>()
        .join(".")
}
