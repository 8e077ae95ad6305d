//! Explicit mapping from command type identifiers to factories.
//!
//! Only registered identifiers can be dispatched; nothing is resolved by
//! name at runtime. Registering an identifier twice is rejected.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::commands::{self, CommandContext};

use super::command::{Command, CommandFactory};

/// Raised when an identifier is registered twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("command type '{type_id}' is already registered")]
pub struct DuplicateCommand {
    /// Identifier registered twice.
    pub type_id: String,
}

/// Lookup table of dispatchable commands.
#[derive(Default)]
pub struct CommandRegistry {
    factories: HashMap<String, CommandFactory>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in command, constructed from `context`.
    #[must_use]
    pub fn standard(context: CommandContext) -> Self {
        let shared = Arc::new(context);
        let factories = commands::builtin_factories(&shared)
            .into_iter()
            .map(|(type_id, factory)| (type_id.to_owned(), factory))
            .collect();
        Self { factories }
    }

    /// Adds a factory for `type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateCommand`] when `type_id` is already registered.
    pub fn register(
        &mut self,
        type_id: impl Into<String>,
        factory: CommandFactory,
    ) -> Result<(), DuplicateCommand> {
        let key = type_id.into();
        if self.factories.contains_key(&key) {
            return Err(DuplicateCommand { type_id: key });
        }
        self.factories.insert(key, factory);
        Ok(())
    }

    /// `true` when `type_id` can be dispatched.
    #[must_use]
    pub fn contains(&self, type_id: &str) -> bool {
        self.factories.contains_key(type_id)
    }

    /// Registered identifiers in sorted order.
    #[must_use]
    pub fn type_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Builds a fresh instance, or `None` for unknown identifiers.
    pub(crate) fn instantiate(&self, type_id: &str) -> Option<Box<dyn Command>> {
        self.factories.get(type_id).map(|factory| factory())
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("type_ids", &self.type_ids())
            .finish()
    }
}
