use super::{Fields, Value};

/// A document read from or written to a collection.
///
/// The id is stable across projects: a document is always written to the
/// target under the id it had in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// Document fields.
    pub fields: Fields,
}

impl Document {
    /// Creates a new document with the given fields.
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Creates a document with no fields.
    pub fn empty(id: impl Into<String>) -> Self {
        Self::new(id, Fields::new())
    }

    /// Sets a field, consuming and returning the document.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns true if the field exists and is not null.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|value| !value.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_fields_are_not_present() {
        let doc = Document::empty("user1")
            .with_field("nome", "Ana")
            .with_field("senha", Value::Null);

        assert!(doc.has("nome"));
        assert!(!doc.has("senha"));
        assert!(!doc.has("email"));
        assert_eq!(doc.get("senha"), Some(&Value::Null));
    }
}
