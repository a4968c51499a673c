//! Placeable templates
//!
//! A template is the prototype the user picks before placing. Placement
//! clones it into a [`PlacedObject`](crate::store::PlacedObject); the template
//! itself is never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name-keyed template identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl TemplateId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Prototype geometry description
///
/// `parts` names the child nodes a clone carries (e.g. "body", "lid").
/// Each part gets its own scene node so hit-tests can land on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    #[serde(default)]
    pub parts: Vec<String>,
}

impl Template {
    /// Template with no sub-parts
    pub fn new(id: impl Into<TemplateId>) -> Self {
        Self {
            id: id.into(),
            parts: Vec::new(),
        }
    }

    /// Builder-style part list
    pub fn with_parts<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parts = parts.into_iter().map(Into::into).collect();
        self
    }
}

/// Registered templates in registration order
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing any existing one with the same id
    pub fn register(&mut self, template: Template) {
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    pub fn get(&self, id: &TemplateId) -> Option<&Template> {
        self.templates.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TemplateId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
