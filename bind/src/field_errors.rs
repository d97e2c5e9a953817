//! Field error map returned to callers

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Wire path → ordered messages.
///
/// Paths keep the order in which they were first reported, and messages for
/// the same path keep the order in which they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding one message for one path
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(path, message);
        errors
    }

    /// Append a message to a path, creating the entry on first use
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) -> &mut Self {
        let path = path.into();
        let message = message.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((path, vec![message])),
        }
        self
    }

    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Number of distinct paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(p, messages)| (p.as_str(), messages.as_slice()))
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, messages) in &self.entries {
            map.serialize_entry(path, messages)?;
        }
        map.end()
    }
}
