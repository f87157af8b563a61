//! Registry of known document types.
//!
//! Built once at startup from configuration and passed by reference to the
//! crawl and render drivers. Listeners are notified whenever a type is added.

use std::collections::BTreeSet;
use std::fmt;

/// Types every site knows about.
pub const BUILTIN_TYPES: &[&str] = &["page", "post"];

type TypeListener = Box<dyn Fn(&str) + Send + Sync>;

pub struct DocumentTypes {
    types: BTreeSet<String>,
    listeners: Vec<TypeListener>,
}

impl DocumentTypes {
    /// Registry holding the built-in types only.
    pub fn new() -> Self {
        Self {
            types: BUILTIN_TYPES.iter().map(|t| t.to_string()).collect(),
            listeners: Vec::new(),
        }
    }

    /// Registry with the built-in types plus `custom`.
    pub fn with_custom<I, S>(custom: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in custom {
            registry.register(name.as_ref());
        }
        registry
    }

    /// Subscribe to future registrations.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Register a type. Returns false if it was already known or the name is blank.
    pub fn register(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || !self.types.insert(name.to_string()) {
            return false;
        }
        for listener in &self.listeners {
            listener(name);
        }
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    /// All known types in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for DocumentTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentTypes")
            .field("types", &self.types)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
