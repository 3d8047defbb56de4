//! Maps node-kind names to implementations.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Error, Result};
use crate::graph::node::Node;

/// A lookup table from node-kind name to a stateless `Node` implementation.
///
/// Unknown kinds never fail a `get`-based lookup path directly: the graph
/// executor treats a lookup miss as "unknown kind, log and skip" rather
/// than propagating this registry's `ConfigError` (spec.md §4.1).
#[derive(Default, Clone)]
pub struct NodeRegistry {
    kinds: HashMap<String, Arc<dyn Node>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `node` under `kind`. Idempotent when the same kind is
    /// registered again with the exact same factory instance; fails with
    /// `ConfigError` when a *different* factory tries to claim an
    /// already-registered kind (spec.md §4.1).
    pub fn register(&mut self, kind: impl Into<String>, node: Arc<dyn Node>) -> Result<()> {
        let kind = kind.into();
        if let Some(existing) = self.kinds.get(&kind) {
            if !Arc::ptr_eq(existing, &node) {
                return Err(Error::ConfigError(format!(
                    "node kind '{kind}' is already registered with a different factory"
                )));
            }
            return Ok(());
        }
        self.kinds.insert(kind, node);
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Result<Arc<dyn Node>> {
        self.kinds
            .get(kind)
            .cloned()
            .ok_or_else(|| Error::ConfigError(format!("unknown node kind '{kind}'")))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }
}
