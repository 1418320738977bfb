//! Element trees decoded from Junos JSON RPC replies.
//!
//! The Junos REST API encodes an XML reply as JSON: every element becomes
//! an array of objects, an object's `"data"` key carries the element text,
//! `"attributes"` carries its attributes, and every other key is a child
//! element.
//!
//! ```text
//! {"route-engine-information": [{
//!     "route-engine": [{
//!         "slot": [{"data": "0"}],
//!         "up-time": [{"data": "12 days", "attributes": {"junos:seconds": "1036800"}}]
//!     }]
//! }]}
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors decoding a reply document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unexpected document shape: {0}")]
    Shape(String),
}

/// One element of a reply document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    text: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Parse a JSON reply into its root element.
    pub fn parse(json: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    /// Convert a decoded JSON reply into its root element.
    ///
    /// The top level must be an object with exactly one key, the root element.
    pub fn from_json(value: &Value) -> Result<Self, DocumentError> {
        let object = value
            .as_object()
            .ok_or_else(|| DocumentError::Shape("top level is not an object".to_string()))?;

        let mut entries = object.iter();
        let (name, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => return Err(DocumentError::Shape("empty reply".to_string())),
            (Some(_), Some(_)) => {
                return Err(DocumentError::Shape(format!(
                    "expected a single root element, found {}",
                    object.len()
                )));
            }
        };

        let mut elements = decode_elements(name, body)?;
        match elements.len() {
            1 => Ok(elements.remove(0)),
            n => Err(DocumentError::Shape(format!(
                "root element '{}' occurs {} times",
                name, n
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed text content; `None` when absent or blank.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Look up an attribute.
    ///
    /// Matches the exact key first, then a namespaced key whose local part
    /// matches (`"celsius"` finds `"junos:celsius"`).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(k, _)| k.rsplit_once(':').is_some_and(|(_, local)| local == name))
            })
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// All elements matching a `/`-separated child path, in document order.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|e| e.children.iter().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    /// First element matching a child path.
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    /// Trimmed text of the first element matching a child path.
    pub fn find_text(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(Element::text)
    }
}

/// Decode the JSON value of one key into the elements it encodes.
fn decode_elements(name: &str, value: &Value) -> Result<Vec<Element>, DocumentError> {
    match value {
        Value::Array(items) => items.iter().map(|item| decode_element(name, item)).collect(),
        other => Ok(vec![decode_element(name, other)?]),
    }
}

fn decode_element(name: &str, value: &Value) -> Result<Element, DocumentError> {
    let mut element = Element::new(name);

    match value {
        Value::Object(fields) => decode_fields(&mut element, fields)?,
        Value::Null => {}
        scalar => element.text = scalar_text(scalar),
    }

    Ok(element)
}

fn decode_fields(element: &mut Element, fields: &Map<String, Value>) -> Result<(), DocumentError> {
    for (key, value) in fields {
        match key.as_str() {
            "data" => element.text = scalar_text(value),
            "attributes" => {
                let attributes = value.as_object().ok_or_else(|| {
                    DocumentError::Shape(format!(
                        "attributes of '{}' is not an object",
                        element.name
                    ))
                })?;
                for (attr, attr_value) in attributes {
                    if let Some(text) = scalar_text(attr_value) {
                        element.attributes.push((attr.clone(), text));
                    }
                }
            }
            child => element.children.extend(decode_elements(child, value)?),
        }
    }
    Ok(())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
