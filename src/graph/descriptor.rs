//! JSON description of a node graph (on-disk graph descriptor format).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: String,
    pub kind: String,
    #[serde(default = "serde_json::Value::default")]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDescriptor {
    pub from_node: String,
    pub from_port: String,
    pub to_node: String,
    pub to_port: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkDescriptor {
    pub name: String,
    pub node: String,
    pub port: String,
}

/// A full graph: its nodes, the edges wiring them, and the named sink
/// outputs a caller extracts results from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphDescriptor {
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    #[serde(default)]
    pub edges: Vec<EdgeDescriptor>,
    #[serde(default)]
    pub sinks: Vec<SinkDescriptor>,
}

impl GraphDescriptor {
    /// An empty graph: no nodes, no edges, no sinks. Every sink lookup on
    /// this graph falls back to its documented default.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> crate::core::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> crate::core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_round_trips() {
        let g = GraphDescriptor::empty();
        let json = g.to_json_pretty().unwrap();
        let back = GraphDescriptor::from_json(&json).unwrap();
        assert!(back.nodes.is_empty());
        assert!(back.edges.is_empty());
        assert!(back.sinks.is_empty());
    }

    #[test]
    fn params_default_to_empty_object() {
        let json = r#"{"nodes":[{"id":"a","kind":"constant-f32"}],"edges":[],"sinks":[]}"#;
        let g = GraphDescriptor::from_json(json).unwrap();
        assert_eq!(g.nodes.len(), 1);
        assert!(g.nodes[0].params.is_null() || g.nodes[0].params.is_object());
    }
}
