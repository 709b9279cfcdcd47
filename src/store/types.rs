//! Candidate records held by the NameStore
//!
//! A candidate is one searchable declaration name plus the optional metadata
//! produced by the documentation generator (module path, description, kind
//! and attribute tags).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One searchable declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub attributes: BTreeSet<String>,
}

impl Candidate {
    /// Create a candidate carrying only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            description: None,
            kind: None,
            attributes: BTreeSet::new(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into());
        self
    }
}

impl From<&str> for Candidate {
    fn from(name: &str) -> Self {
        Candidate::new(name)
    }
}

impl From<String> for Candidate {
    fn from(name: String) -> Self {
        Candidate::new(name)
    }
}
