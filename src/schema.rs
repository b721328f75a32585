//! Extraction schema: a base selector plus named field rules
//!
//! Schemas are written in the same JSON shape scraping tools commonly use:
//!
//! ```json
//! {
//!   "name": "Product cards",
//!   "baseSelector": "article",
//!   "fields": [
//!     { "name": "product_name", "selector": "h2 > a", "type": "text" },
//!     { "name": "product_link", "selector": "a[itemprop='url']", "type": "attribute", "attribute": "href" }
//!   ]
//! }
//! ```
//!
//! [`ExtractionSchema::compile`] validates the definition and parses every
//! selector up front, so extraction itself never fails on a bad schema.

use std::collections::HashSet;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// How a field's value is read from its matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Visible text, whitespace-normalized
    Text,
    /// Raw value of a named attribute
    Attribute,
    /// Inner HTML
    Html,
}

/// Raw field rule, as read from a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// CSS selector evaluated inside each base element
    pub selector: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Attribute to read; required for `attribute` fields only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl FieldDefinition {
    pub fn text(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            kind: FieldKind::Text,
            attribute: None,
        }
    }

    pub fn attribute(
        name: impl Into<String>,
        selector: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            kind: FieldKind::Attribute,
            attribute: Some(attribute.into()),
        }
    }

    pub fn html(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            kind: FieldKind::Html,
            attribute: None,
        }
    }
}

/// Raw schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    /// Human-readable label
    #[serde(default)]
    pub name: String,
    /// Selector for the repeating record container
    pub base_selector: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// What to read from a matched element. The attribute name lives in the
/// variant, so an attribute field without one cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAccessor {
    Text,
    Attribute(String),
    Html,
}

/// A validated field with its compiled selector.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    selector: Selector,
    accessor: FieldAccessor,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn accessor(&self) -> &FieldAccessor {
        &self.accessor
    }
}

/// A validated, compiled schema. Immutable and shareable across threads.
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    definition: SchemaDefinition,
    base: Selector,
    fields: Vec<Field>,
}

impl ExtractionSchema {
    /// Validate a definition and compile its selectors.
    pub fn compile(definition: SchemaDefinition) -> Result<Self, SchemaError> {
        let base = parse_selector(&definition.base_selector).map_err(|reason| {
            SchemaError::InvalidBaseSelector {
                selector: definition.base_selector.clone(),
                reason,
            }
        })?;

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(definition.fields.len());

        for (position, def) in definition.fields.iter().enumerate() {
            if def.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName(position));
            }
            if !seen.insert(def.name.as_str()) {
                return Err(SchemaError::DuplicateField(def.name.clone()));
            }

            let accessor = match (def.kind, &def.attribute) {
                (FieldKind::Attribute, Some(attr)) if !attr.trim().is_empty() => {
                    FieldAccessor::Attribute(attr.clone())
                }
                (FieldKind::Attribute, _) => {
                    return Err(SchemaError::MissingAttribute {
                        field: def.name.clone(),
                    });
                }
                (_, Some(attr)) => {
                    return Err(SchemaError::UnexpectedAttribute {
                        field: def.name.clone(),
                        attribute: attr.clone(),
                    });
                }
                (FieldKind::Text, None) => FieldAccessor::Text,
                (FieldKind::Html, None) => FieldAccessor::Html,
            };

            let selector =
                parse_selector(&def.selector).map_err(|reason| SchemaError::InvalidFieldSelector {
                    field: def.name.clone(),
                    selector: def.selector.clone(),
                    reason,
                })?;

            fields.push(Field {
                name: def.name.clone(),
                selector,
                accessor,
            });
        }

        Ok(Self {
            definition,
            base,
            fields,
        })
    }

    /// Shorthand for building a schema in code.
    pub fn new(
        name: impl Into<String>,
        base_selector: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Result<Self, SchemaError> {
        Self::compile(SchemaDefinition {
            name: name.into(),
            base_selector: base_selector.into(),
            fields,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let definition: SchemaDefinition = serde_json::from_str(json)?;
        Self::compile(definition)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Source text of the base selector
    pub fn base_selector(&self) -> &str {
        &self.definition.base_selector
    }

    pub(crate) fn base(&self) -> &Selector {
        &self.base
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(Field::name)
    }

    /// The definition this schema was compiled from.
    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }
}

/// Parse a selector, rejecting unclosed brackets and parentheses that the CSS
/// tokenizer would otherwise close silently at end of input.
fn parse_selector(source: &str) -> Result<Selector, String> {
    check_balanced(source)?;
    Selector::parse(source).map_err(|e| e.to_string())
}

fn check_balanced(source: &str) -> Result<(), String> {
    let mut open = Vec::new();
    let mut quote = None;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (_, '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                skip_comment(&mut chars)?;
            }
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => open.push(c),
            (None, ']') if open.last() == Some(&'[') => {
                open.pop();
            }
            (None, ')') if open.last() == Some(&'(') => {
                open.pop();
            }
            (None, ']' | ')') => return Err(format!("unexpected `{c}`")),
            (None, _) => {}
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated string starting with {q}"));
    }
    match open.last() {
        Some(c) => Err(format!("unclosed `{c}`")),
        None => Ok(()),
    }
}

/// Consume a comment body up to and including the closing `*/`.
fn skip_comment(chars: &mut Peekable<Chars<'_>>) -> Result<(), String> {
    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'/') {
            chars.next();
            return Ok(());
        }
    }
    Err("unterminated comment".to_string())
}
