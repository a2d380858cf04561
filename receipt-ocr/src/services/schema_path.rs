//! Typed navigation over untyped provider documents
//!
//! A [`SchemaPath`] is a cursor into a `serde_json::Value` that remembers
//! the dotted path it took (`images[0].receipt.result`). Every step either
//! yields the next cursor or a [`PathError`] naming the full path of the
//! first segment that was missing or had the wrong shape.

use serde_json::Value;
use thiserror::Error;

/// First missing or mis-shaped segment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: String,
}

/// Cursor into a JSON document
#[derive(Debug, Clone)]
pub struct SchemaPath<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> SchemaPath<'a> {
    pub fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Step into an object member. Null members count as missing.
    pub fn field(&self, name: &str) -> Result<SchemaPath<'a>, PathError> {
        let path = if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        };

        let map = match self.value {
            Value::Object(map) => map,
            other => {
                return Err(PathError {
                    path,
                    reason: format!("expected object, found {}", kind(other)),
                })
            }
        };

        match map.get(name) {
            Some(value) if !value.is_null() => Ok(SchemaPath { value, path }),
            _ => Err(PathError {
                path,
                reason: "missing".to_string(),
            }),
        }
    }

    /// Step into an array element
    pub fn index(&self, i: usize) -> Result<SchemaPath<'a>, PathError> {
        let path = format!("{}[{}]", self.path, i);

        let items = match self.value {
            Value::Array(items) => items,
            other => {
                return Err(PathError {
                    path,
                    reason: format!("expected array, found {}", kind(other)),
                })
            }
        };

        match items.get(i) {
            Some(value) if !value.is_null() => Ok(SchemaPath { value, path }),
            _ => Err(PathError {
                path,
                reason: format!("missing (array has {} elements)", items.len()),
            }),
        }
    }

    /// Every element of an array node
    pub fn items(&self) -> Result<Vec<SchemaPath<'a>>, PathError> {
        match self.value {
            Value::Array(items) => Ok(items
                .iter()
                .enumerate()
                .map(|(i, value)| SchemaPath {
                    value,
                    path: format!("{}[{}]", self.path, i),
                })
                .collect()),
            other => Err(PathError {
                path: self.path.clone(),
                reason: format!("expected array, found {}", kind(other)),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&'a str, PathError> {
        self.value.as_str().ok_or_else(|| PathError {
            path: self.path.clone(),
            reason: format!("expected string, found {}", kind(self.value)),
        })
    }

    /// Cursor at `formatted.value`, the provider's leaf wrapper
    pub fn formatted(&self) -> Result<SchemaPath<'a>, PathError> {
        self.field("formatted")?.field("value")
    }

    /// Text at `formatted.value`
    pub fn formatted_value(&self) -> Result<&'a str, PathError> {
        self.formatted()?.as_str()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "images": [{
                "receipt": {
                    "result": {
                        "storeInfo": {"name": {"formatted": {"value": "ACME Mart"}}},
                        "tags": ["a", "b"],
                        "count": 3,
                        "gone": null
                    }
                }
            }]
        })
    }

    fn result(doc: &Value) -> SchemaPath<'_> {
        SchemaPath::root(doc)
            .field("images")
            .and_then(|p| p.index(0))
            .and_then(|p| p.field("receipt"))
            .and_then(|p| p.field("result"))
            .unwrap()
    }

    #[test]
    fn test_path_tracks_every_step() {
        let doc = doc();
        let cursor = result(&doc);
        assert_eq!(cursor.path(), "images[0].receipt.result");

        let name = cursor.field("storeInfo").unwrap().field("name").unwrap();
        assert_eq!(name.formatted_value().unwrap(), "ACME Mart");
        assert_eq!(name.formatted().unwrap().path(), "images[0].receipt.result.storeInfo.name.formatted.value");
    }

    #[test]
    fn test_missing_field_names_full_path() {
        let doc = doc();
        let err = result(&doc).field("totalPrice").unwrap_err();
        assert_eq!(err.path, "images[0].receipt.result.totalPrice");
        assert_eq!(err.reason, "missing");
    }

    #[test]
    fn test_null_counts_as_missing() {
        let doc = doc();
        let err = result(&doc).field("gone").unwrap_err();
        assert_eq!(err.path, "images[0].receipt.result.gone");
    }

    #[test]
    fn test_wrong_shape_reported() {
        let doc = doc();
        let cursor = result(&doc);

        let err = cursor.field("count").unwrap().field("value").unwrap_err();
        assert_eq!(err.path, "images[0].receipt.result.count.value");
        assert!(err.reason.contains("found number"));

        let err = cursor.field("tags").unwrap().index(5).unwrap_err();
        assert_eq!(err.path, "images[0].receipt.result.tags[5]");

        let err = cursor.field("count").unwrap().as_str().unwrap_err();
        assert!(err.reason.contains("expected string"));

        assert!(cursor.field("storeInfo").unwrap().items().is_err());
    }

    #[test]
    fn test_items_paths() {
        let doc = doc();
        let tags = result(&doc).field("tags").unwrap().items().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].path(), "images[0].receipt.result.tags[1]");
        assert_eq!(tags[1].as_str().unwrap(), "b");
    }

    #[test]
    fn test_empty_root_array() {
        let doc = json!({"images": []});
        let err = SchemaPath::root(&doc)
            .field("images")
            .and_then(|p| p.index(0))
            .unwrap_err();
        assert_eq!(err.path, "images[0]");
    }
}
