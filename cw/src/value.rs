//! Configuration values produced by templates
//!
//! A template returns a tree of [`ConfigValue`]s. Tables keep the insertion
//! order of their keys and carry a [`TableStyle`] that the serializer uses to
//! decide between dotted keys, `[section]` headers and inline tables.
//!
//! The same types are the wire format between the JavaScript runtime and this
//! process, so they derive `serde` with an adjacently tagged representation:
//!
//! ```json
//! {"type": "table", "value": {"style": "section", "entries": [["name", {"type": "string", "value": "x"}]]}}
//! ```
//!
//! Integers may arrive as JSON numbers or as decimal text; the runtime uses
//! text for values beyond the range a JavaScript number holds exactly.

use serde::{Deserialize, Deserializer, Serialize};

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum ConfigValue {
    String(String),
    Integer(#[serde(deserialize_with = "integer_from_wire")] i64),
    Float(f64),
    Boolean(bool),
    /// TOML datetime text (RFC 3339 or a local date/time)
    Datetime(String),
    Array(Vec<ConfigValue>),
    Table(ConfigTable),
}

fn integer_from_wire<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Number(i64),
        Text(String),
    }

    match Wire::deserialize(deserializer)? {
        Wire::Number(n) => Ok(n),
        Wire::Text(text) => text
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid integer {:?}: {}", text, e))),
    }
}

/// How a table should be laid out when serialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableStyle {
    /// Flattened into dotted keys of the enclosing table
    #[default]
    Plain,
    /// Written under its own `[header]` (or `[[header]]` inside an array)
    Section,
    /// Written as `{ key = value }`
    Inline,
}

/// An ordered mapping from keys to values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigTable {
    #[serde(default)]
    pub style: TableStyle,
    pub entries: Vec<(String, ConfigValue)>,
}

impl ConfigTable {
    /// Create an empty plain table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing an existing entry with the same key in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`ConfigTable::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_section(&self) -> bool {
        self.style == TableStyle::Section
    }
}

impl ConfigValue {
    /// The table inside this value, if it is one
    pub fn as_table(&self) -> Option<&ConfigTable> {
        match self {
            ConfigValue::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Check whether this value is a table tagged as a section
    pub fn is_section(&self) -> bool {
        self.as_table().is_some_and(ConfigTable::is_section)
    }

    /// Short name of the value's kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::String(_) => "string",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Boolean(_) => "boolean",
            ConfigValue::Datetime(_) => "datetime",
            ConfigValue::Array(_) => "array",
            ConfigValue::Table(_) => "table",
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(value.into())
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

impl From<ConfigTable> for ConfigValue {
    fn from(value: ConfigTable) -> Self {
        ConfigValue::Table(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(values: Vec<T>) -> Self {
        ConfigValue::Array(values.into_iter().map(Into::into).collect())
    }
}

/// The capability object handed to a template
///
/// Mirrors the object the JavaScript runtime passes to `template(...)`:
/// `section` (the runtime's `Section`) and `inline` tag a table without
/// changing its content. `integer` and `float` (the runtime's `Integer` and
/// `Float`) pin a number's TOML type; other scalars are built through the
/// `From` impls on [`ConfigValue`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities;

impl Capabilities {
    /// Tag a table so it is written under its own header
    pub fn section(&self, table: ConfigTable) -> ConfigValue {
        ConfigValue::Table(ConfigTable {
            style: TableStyle::Section,
            ..table
        })
    }

    /// Tag a table so it is written as an inline table
    pub fn inline(&self, table: ConfigTable) -> ConfigValue {
        ConfigValue::Table(ConfigTable {
            style: TableStyle::Inline,
            ..table
        })
    }

    pub fn integer(&self, value: i64) -> ConfigValue {
        ConfigValue::Integer(value)
    }

    /// A float, written with a fractional part even when it is integral
    pub fn float(&self, value: f64) -> ConfigValue {
        ConfigValue::Float(value)
    }

    /// Build a plain table from ordered entries
    pub fn table<K, V, I>(&self, entries: I) -> ConfigTable
    where
        K: Into<String>,
        V: Into<ConfigValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut table = ConfigTable::new();
        for (key, value) in entries {
            table.insert(key, value);
        }
        table
    }

    pub fn is_section(&self, value: &ConfigValue) -> bool {
        value.is_section()
    }
}
