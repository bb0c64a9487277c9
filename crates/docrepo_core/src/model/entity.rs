//! Entity base contract and the schema-less `Document` entity.
//!
//! # Responsibility
//! - Give every persisted record a fixed collection name and a lazily
//!   assigned identifier.
//! - Convert entities to and from stored JSON bodies.
//!
//! # Invariants
//! - `collection_name()` never changes; storage refuses entities whose
//!   collection name is blank.
//! - Once an identifier is assigned it is never replaced by another one.
//! - Stored bodies never carry the `id` key; the id lives beside the body.

use crate::model::identity::generate_id;
use crate::repo::error::{RepoError, RepoResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which the identifier is exposed in entity JSON.
pub const ID_FIELD: &str = "id";

/// A record persisted in one collection of the document store.
pub trait Entity: Serialize + DeserializeOwned {
    /// Collection this entity belongs to for its whole lifetime.
    fn collection_name(&self) -> &str;

    /// Identifier assigned so far, if any.
    fn identifier(&self) -> Option<&str>;

    /// Mutable access to the identifier slot.
    fn identifier_slot(&mut self) -> &mut Option<String>;

    /// Returns the assigned identifier, or generates a fresh one.
    ///
    /// A generated identifier is *not* stored on the entity: two calls on an
    /// entity that was never persisted may return different values. Use
    /// [`Entity::ensure_identifier`] when one stable value is required.
    fn get_identifier(&self) -> String {
        match self.identifier() {
            Some(id) => id.to_string(),
            None => generate_id(self.collection_name()),
        }
    }

    /// Returns the assigned identifier, generating and storing one if absent.
    fn ensure_identifier(&mut self) -> String {
        if let Some(id) = self.identifier() {
            return id.to_string();
        }
        let id = generate_id(self.collection_name());
        *self.identifier_slot() = Some(id.clone());
        id
    }

    /// Assigns `id` unless a different identifier is already set.
    fn assign_identifier(&mut self, id: &str) -> RepoResult<()> {
        match self.identifier() {
            Some(existing) if existing == id => Ok(()),
            Some(existing) => Err(RepoError::PreconditionViolation(format!(
                "identifier `{existing}` cannot be reassigned to `{id}`"
            ))),
            None => {
                *self.identifier_slot() = Some(id.to_string());
                Ok(())
            }
        }
    }

    /// Serializes the entity into a stored body (without the id key).
    fn to_body(&self) -> RepoResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(mut body) => {
                body.remove(ID_FIELD);
                Ok(body)
            }
            other => Err(RepoError::Serialization(format!(
                "entity must serialize to a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Rebuilds an entity from a stored body with metadata already removed.
    fn from_body(_collection: &str, id: String, mut body: Map<String, Value>) -> RepoResult<Self> {
        body.insert(ID_FIELD.to_string(), Value::String(id));
        Ok(serde_json::from_value(Value::Object(body))?)
    }
}

/// Schema-less entity: a collection name, an optional id and arbitrary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip)]
    collection: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Creates an empty document bound to `collection`.
    ///
    /// # Errors
    /// - `InvalidArgument` when `collection` is blank.
    pub fn new(collection: impl Into<String>) -> RepoResult<Self> {
        let collection = collection.into();
        if collection.trim().is_empty() {
            return Err(RepoError::InvalidArgument(
                "collection name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: None,
            collection,
            fields: Map::new(),
        })
    }

    /// Creates a document from a JSON object value.
    ///
    /// An `id` key in `value` becomes the document identifier.
    pub fn from_json(collection: impl Into<String>, value: Value) -> RepoResult<Self> {
        let mut document = Self::new(collection)?;
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(RepoError::InvalidArgument(format!(
                    "document must be a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };
        if let Some(id) = fields.remove(ID_FIELD) {
            match id {
                Value::String(id) => document.id = Some(id),
                Value::Null => {}
                other => {
                    return Err(RepoError::InvalidArgument(format!(
                        "document id must be a string, got {}",
                        json_kind(&other)
                    )))
                }
            }
        }
        document.fields = fields;
        Ok(document)
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Reads one field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets one field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }
}

impl Entity for Document {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn identifier(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn identifier_slot(&mut self) -> &mut Option<String> {
        &mut self.id
    }

    fn from_body(collection: &str, id: String, body: Map<String, Value>) -> RepoResult<Self> {
        let mut document = Self::new(collection)?;
        document.id = Some(id);
        document.fields = body;
        Ok(document)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
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
    use super::{Document, Entity};
    use crate::repo::error::RepoError;
    use serde_json::json;

    #[test]
    fn blank_collection_is_rejected() {
        assert!(matches!(
            Document::new("  "),
            Err(RepoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn assigned_identifier_is_returned_unchanged() {
        let mut document = Document::new("Persons").unwrap();
        document.assign_identifier("PERSONS-1").unwrap();
        assert_eq!(document.get_identifier(), "PERSONS-1");
        assert_eq!(document.get_identifier(), "PERSONS-1");
    }

    #[test]
    fn reassigning_a_different_identifier_is_a_precondition_violation() {
        let mut document = Document::new("Persons").unwrap();
        document.assign_identifier("PERSONS-1").unwrap();
        document.assign_identifier("PERSONS-1").unwrap();
        let err = document.assign_identifier("PERSONS-2").unwrap_err();
        assert!(matches!(err, RepoError::PreconditionViolation(_)));
    }

    #[test]
    fn ensure_identifier_memoizes() {
        let mut document = Document::new("Persons").unwrap();
        let first = document.ensure_identifier();
        assert_eq!(document.ensure_identifier(), first);
        assert_eq!(document.identifier(), Some(first.as_str()));
    }

    #[test]
    fn body_excludes_id_and_from_body_restores_it() {
        let document = Document::from_json("Persons", json!({"id": "p/1", "name": "Ann"})).unwrap();
        let body = document.to_body().unwrap();
        assert!(!body.contains_key("id"));
        assert_eq!(body.get("name"), Some(&json!("Ann")));

        let restored = Document::from_body("Persons", "p/1".to_string(), body).unwrap();
        assert_eq!(restored.collection_name(), "Persons");
        assert_eq!(restored.identifier(), Some("p/1"));
    }
}
