//! Strict field extraction for protobuf-style JSON objects
//!
//! Plan documents follow protobuf JSON conventions: absent fields take
//! their default value, but a present field must have the right type and
//! an object must not carry keys the schema does not know. These helpers
//! consume fields one by one and report anything left over.

use crate::error::{DocumentError, DocumentResult};
use serde_json::{Map, Value};

/// Field-by-field reader over one JSON object.
///
/// Every accessor marks its key as consumed; [`ObjectUnpacker::finish`]
/// fails if any keys were never asked for.
#[derive(Debug)]
pub struct ObjectUnpacker<'a> {
    context: String,
    fields: &'a Map<String, Value>,
    consumed: Vec<&'a str>,
}

impl<'a> ObjectUnpacker<'a> {
    pub fn new(context: impl Into<String>, value: &'a Value) -> DocumentResult<Self> {
        let context = context.into();
        match value.as_object() {
            Some(fields) => Ok(Self {
                context,
                fields,
                consumed: Vec::new(),
            }),
            None => Err(DocumentError::NotAnObject { context }),
        }
    }

    /// The field value if present, consuming the key.
    pub fn optional(&mut self, key: &'static str) -> Option<&'a Value> {
        self.take(key)
    }

    /// The field value, or a missing-key error.
    pub fn required(&mut self, key: &'static str) -> DocumentResult<&'a Value> {
        self.take(key).ok_or_else(|| self.missing(key))
    }

    /// A required string field.
    pub fn string(&mut self, key: &'static str) -> DocumentResult<&'a str> {
        match self.take(key) {
            None => Err(self.missing(key)),
            Some(value) => value
                .as_str()
                .ok_or_else(|| self.type_error(key, "a string")),
        }
    }

    /// An array field, defaulting to empty when absent.
    pub fn array_or_default(&mut self, key: &'static str) -> DocumentResult<&'a [Value]> {
        match self.take(key) {
            None => Ok(&[]),
            Some(value) => value
                .as_array()
                .map(Vec::as_slice)
                .ok_or_else(|| self.type_error(key, "an array")),
        }
    }

    /// An array-of-strings field, defaulting to empty when absent.
    pub fn string_array_or_default(&mut self, key: &'static str) -> DocumentResult<Vec<String>> {
        match self.take(key) {
            None => Ok(Vec::new()),
            Some(value) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| self.type_error(key, "an array"))?;
                items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| self.type_error(key, "an array of strings"))
                    })
                    .collect()
            }
        }
    }

    /// Fails with the list of keys no accessor consumed.
    pub fn finish(self) -> DocumentResult<()> {
        let unknown: Vec<&str> = self
            .fields
            .keys()
            .map(String::as_str)
            .filter(|key| !self.consumed.contains(key))
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(DocumentError::UnknownKeys {
                context: self.context,
                keys: unknown.join(", "),
            })
        }
    }

    fn take(&mut self, key: &'static str) -> Option<&'a Value> {
        let value = self.fields.get(key);
        if value.is_some() {
            self.consumed.push(key);
        }
        value
    }

    fn missing(&self, key: &str) -> DocumentError {
        DocumentError::MissingKey {
            key: key.to_string(),
            context: self.context.clone(),
        }
    }

    fn type_error(&self, key: &str, expected: &str) -> DocumentError {
        DocumentError::UnexpectedType {
            key: key.to_string(),
            context: self.context.clone(),
            expected: expected.to_string(),
        }
    }
}

/// Reader for a oneof-style object: exactly one key, dispatched by name.
#[derive(Debug)]
pub struct OneOfUnpacker<'a> {
    context: String,
    key: &'a str,
    value: &'a Value,
}

impl<'a> OneOfUnpacker<'a> {
    pub fn new(context: impl Into<String>, value: &'a Value) -> DocumentResult<Self> {
        let context = context.into();
        let fields = match value.as_object() {
            Some(fields) => fields,
            None => return Err(DocumentError::NotAnObject { context }),
        };
        let mut iter = fields.iter();
        match (iter.next(), iter.next()) {
            (Some((key, value)), None) => Ok(Self {
                context,
                key: key.as_str(),
                value,
            }),
            _ => Err(DocumentError::OneOfNotSingular { context }),
        }
    }

    pub fn variant(&self) -> &'a str {
        self.key
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Error for a variant no caller recognized.
    pub fn unknown(self) -> DocumentError {
        DocumentError::UnknownVariant {
            context: self.context,
            variant: self.key.to_string(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
