//! Decoder configuration handle.
//!
//! [`DecoderConfig`] holds one typed value per option of an [`ArgSchema`],
//! seeded from the schema defaults.  Values can be set programmatically or
//! merged from an argument file with [`DecoderConfig::parse_file`].
//!
//! # Argument file format
//!
//! ```text
//! # comment lines start with '#'
//! -dict  /models/en/cmudict.dict
//! -lm    "/models/en/my model.lm"
//! -kws_threshold 1e-20
//! ```
//!
//! Options and values are whitespace separated and may span lines; a value
//! containing spaces is written in double quotes.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::decoder::args::{ArgSchema, ArgSpec, ArgValue};
use crate::error::{RecognizerError, Result};

// ---------------------------------------------------------------------------
// DecoderConfig
// ---------------------------------------------------------------------------

/// Typed option values for a decoder instance.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    schema: Arc<ArgSchema>,
    values: BTreeMap<&'static str, ArgValue>,
}

impl DecoderConfig {
    /// Create a configuration holding every default declared by `schema`.
    pub fn new(schema: Arc<ArgSchema>) -> Self {
        let values = schema
            .specs()
            .iter()
            .filter_map(|spec| {
                let value = spec.default.and_then(|raw| spec.kind.parse(raw))?;
                Some((spec.name, value))
            })
            .collect();
        Self { schema, values }
    }

    pub fn schema(&self) -> &ArgSchema {
        &self.schema
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    /// Set `name` from its textual form, parsed according to the schema.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<()> {
        let spec = self.spec(name)?;
        let value = spec.kind.parse(raw).ok_or_else(|| {
            RecognizerError::ConfigParse(format!(
                "invalid {:?} value for {}: {raw:?}",
                spec.kind, spec.name
            ))
        })?;
        self.values.insert(spec.name, value);
        Ok(())
    }

    pub fn set_str(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.set_typed(name, ArgValue::Str(value.into()))
    }

    pub fn set_float(&mut self, name: &str, value: f64) -> Result<()> {
        self.set_typed(name, ArgValue::Float(value))
    }

    pub fn set_int(&mut self, name: &str, value: i64) -> Result<()> {
        self.set_typed(name, ArgValue::Int(value))
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.set_typed(name, ArgValue::Bool(value))
    }

    fn set_typed(&mut self, name: &str, value: ArgValue) -> Result<()> {
        let spec = self.spec(name)?;
        if spec.kind != value.kind() {
            return Err(RecognizerError::ConfigParse(format!(
                "option {} expects a {:?} value, got {:?}",
                spec.name,
                spec.kind,
                value.kind()
            )));
        }
        self.values.insert(spec.name, value);
        Ok(())
    }

    fn spec(&self, name: &str) -> Result<ArgSpec> {
        self.schema
            .spec(name)
            .copied()
            .ok_or_else(|| RecognizerError::ConfigParse(format!("unknown option {name}")))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn str_value(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn float_value(&self, name: &str) -> Option<f64> {
        match self.values.get(name)? {
            ArgValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn int_value(&self, name: &str) -> Option<i64> {
        match self.values.get(name)? {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn bool_value(&self, name: &str) -> Option<bool> {
        match self.values.get(name)? {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// All options that currently hold a value, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ArgValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    // -----------------------------------------------------------------------
    // Argument files
    // -----------------------------------------------------------------------

    /// Merge options from the argument file at `path`.
    ///
    /// Values from the file override those already set.  Options the schema
    /// does not know are skipped with a warning.  Returns the number of
    /// options applied.
    ///
    /// # Errors
    ///
    /// [`RecognizerError::ConfigParse`] when the file cannot be read, a
    /// token is not an option name, an option has no value, a quote is left
    /// open, or a value does not parse as the declared type.  Nothing is
    /// applied in that case.
    pub fn parse_file(&mut self, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RecognizerError::ConfigParse(format!("cannot read {}: {e}", path.display()))
        })?;
        self.merge_args(&text)
            .map_err(|e| match e {
                RecognizerError::ConfigParse(msg) => {
                    RecognizerError::ConfigParse(format!("{}: {msg}", path.display()))
                }
                other => other,
            })
    }

    /// Merge options from argument-file text.  See [`Self::parse_file`].
    pub fn merge_args(&mut self, text: &str) -> Result<usize> {
        let tokens = tokenize(text)?;
        let mut staged: Vec<(&'static str, ArgValue)> = Vec::new();

        let mut iter = tokens.into_iter();
        while let Some(name) = iter.next() {
            if !name.starts_with('-') {
                return Err(RecognizerError::ConfigParse(format!(
                    "expected an option name, found {name:?}"
                )));
            }
            let raw = iter.next().ok_or_else(|| {
                RecognizerError::ConfigParse(format!("option {name} has no value"))
            })?;

            let Some(spec) = self.schema.spec(&name) else {
                log::warn!("decoder config: skipping unknown option {name}");
                continue;
            };
            let value = spec.kind.parse(&raw).ok_or_else(|| {
                RecognizerError::ConfigParse(format!(
                    "invalid {:?} value for {name}: {raw:?}",
                    spec.kind
                ))
            })?;
            staged.push((spec.name, value));
        }

        let applied = staged.len();
        self.values.extend(staged);
        Ok(applied)
    }
}

fn tokenize(text: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut chars = line.chars().peekable();
        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            let Some(&first) = chars.peek() else { break };

            let mut token = String::new();
            if first == '"' {
                chars.next();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    token.push(c);
                }
                if !closed {
                    return Err(RecognizerError::ConfigParse(format!(
                        "unterminated quote in line {line:?}"
                    )));
                }
            } else {
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    token.push(c);
                }
            }
            tokens.push(token);
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
