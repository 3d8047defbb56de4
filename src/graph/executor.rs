//! Topological sort and linear execution of a node graph.

use std::collections::HashMap;

use crate::core::{Error, Result};
use crate::graph::descriptor::GraphDescriptor;
use crate::graph::node::NodeContext;
use crate::graph::port::PortValue;
use crate::graph::registry::NodeRegistry;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Unseen,
    OnStack,
    Done,
}

/// Orders graph nodes so every node runs after its dependencies, using an
/// iterative three-color DFS (no recursion, so a pathological graph depth
/// cannot blow the call stack).
pub fn topo_sort(graph: &GraphDescriptor) -> Result<Vec<String>> {
    let mut deps: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in &graph.nodes {
        deps.entry(node.id.as_str()).or_default();
    }
    for edge in &graph.edges {
        deps.entry(edge.to_node.as_str()).or_default().push(edge.from_node.as_str());
    }

    let mut color: HashMap<&str, Color> =
        graph.nodes.iter().map(|n| (n.id.as_str(), Color::Unseen)).collect();
    let mut order = Vec::with_capacity(graph.nodes.len());

    for node in &graph.nodes {
        if color[node.id.as_str()] != Color::Unseen {
            continue;
        }
        // (node id, next dependency index to visit)
        let mut stack: Vec<(&str, usize)> = vec![(node.id.as_str(), 0)];
        color.insert(node.id.as_str(), Color::OnStack);

        while let Some(&(id, idx)) = stack.last() {
            let deps_of_id = &deps[id];
            if idx < deps_of_id.len() {
                let dep = deps_of_id[idx];
                stack.last_mut().unwrap().1 += 1;
                match color.get(dep).copied() {
                    Some(Color::Unseen) | None => {
                        color.insert(dep, Color::OnStack);
                        stack.push((dep, 0));
                    }
                    Some(Color::OnStack) => {
                        return Err(Error::CycleError { node: dep.to_string() });
                    }
                    Some(Color::Done) => {}
                }
            } else {
                color.insert(id, Color::Done);
                order.push(id.to_string());
                stack.pop();
            }
        }
    }

    Ok(order)
}

/// Runs every node in `graph` in dependency order and returns the named
/// sink outputs. Unknown node kinds are logged and skipped rather than
/// aborting the run; a registered node whose `process` fails aborts the
/// whole execution with the error annotated by node id and kind
/// (spec.md §4.1).
pub fn execute(
    graph: &GraphDescriptor,
    registry: &NodeRegistry,
    ctx: &NodeContext,
) -> Result<HashMap<String, PortValue>> {
    let order = topo_sort(graph)?;

    let nodes_by_id: HashMap<&str, &crate::graph::descriptor::NodeDescriptor> =
        graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut incoming: HashMap<&str, Vec<&crate::graph::descriptor::EdgeDescriptor>> = HashMap::new();
    for edge in &graph.edges {
        incoming.entry(edge.to_node.as_str()).or_default().push(edge);
    }

    let mut outputs: HashMap<String, HashMap<String, PortValue>> = HashMap::new();

    for id in &order {
        let descriptor = nodes_by_id
            .get(id.as_str())
            .ok_or_else(|| Error::InternalError(format!("node {id} vanished from graph")))?;

        // Unknown node kinds are logged and skipped (spec.md §4.1): the node
        // produces no outputs, so its downstream inputs become absent
        // rather than aborting the whole execution.
        let node = match registry.get(&descriptor.kind) {
            Ok(node) => node,
            Err(_) => {
                log::warn!("skipping node '{id}' of unknown kind '{}'", descriptor.kind);
                outputs.insert(id.clone(), HashMap::new());
                continue;
            }
        };

        let mut inputs = HashMap::new();
        if let Some(edges) = incoming.get(id.as_str()) {
            for edge in edges {
                let Some(producer_outputs) = outputs.get(edge.from_node.as_str()) else {
                    continue;
                };
                if let Some(value) = producer_outputs.get(edge.from_port.as_str()) {
                    inputs.insert(edge.to_port.clone(), value.clone());
                }
            }
        }

        let node_outputs = node
            .process(&inputs, &descriptor.params, ctx)
            .map_err(|e| annotate_node_failure(e, id, &descriptor.kind))?;
        outputs.insert(id.clone(), node_outputs);
    }

    let mut sinks = HashMap::new();
    for sink in &graph.sinks {
        let value = outputs
            .get(sink.node.as_str())
            .and_then(|out| out.get(sink.port.as_str()))
            .cloned()
            .or_else(|| {
                // Fall back to the most recently produced output port with
                // a matching name, in execution order, when the named node
                // doesn't exist or didn't produce that port.
                order.iter().rev().find_map(|id| outputs.get(id)?.get(sink.port.as_str()).cloned())
            })
            .ok_or_else(|| Error::MissingOutputError { sink: sink.name.clone() })?;
        sinks.insert(sink.name.clone(), value);
    }

    Ok(sinks)
}

/// Wraps a node's `process` failure with its node id and kind, per spec.md
/// §4.1 ("the underlying error annotated with node id and kind").
fn annotate_node_failure(source: Error, node: &str, kind: &str) -> Error {
    Error::NodeFailure { node: node.to_string(), kind: kind.to_string(), source: Box::new(source) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builtin::register_defaults;
    use crate::graph::descriptor::{EdgeDescriptor, NodeDescriptor, SinkDescriptor};

    fn ctx() -> NodeContext {
        NodeContext { width: 4, height: 4, world_seed: 1, origin_x: 0, origin_z: 0 }
    }

    #[test]
    fn empty_graph_executes_to_no_sinks() {
        let graph = GraphDescriptor::empty();
        let registry = NodeRegistry::new();
        let sinks = execute(&graph, &registry, &ctx()).unwrap();
        assert!(sinks.is_empty());
    }

    #[test]
    fn detects_cycles() {
        let graph = GraphDescriptor {
            nodes: vec![
                NodeDescriptor { id: "a".into(), kind: "constant-f32".into(), params: serde_json::json!({}) },
                NodeDescriptor { id: "b".into(), kind: "normalize".into(), params: serde_json::json!({}) },
            ],
            edges: vec![
                EdgeDescriptor { from_node: "a".into(), from_port: "out".into(), to_node: "b".into(), to_port: "in".into() },
                EdgeDescriptor { from_node: "b".into(), from_port: "out".into(), to_node: "a".into(), to_port: "in".into() },
            ],
            sinks: vec![],
        };
        let mut registry = NodeRegistry::new();
        register_defaults(&mut registry).unwrap();
        let err = execute(&graph, &registry, &ctx()).unwrap_err();
        assert!(matches!(err, Error::CycleError { .. }));
    }

    #[test]
    fn linear_chain_reaches_sink() {
        let graph = GraphDescriptor {
            nodes: vec![
                NodeDescriptor {
                    id: "height".into(),
                    kind: "constant-f32".into(),
                    params: serde_json::json!({"value": 0.5}),
                },
                NodeDescriptor { id: "norm".into(), kind: "normalize".into(), params: serde_json::json!({}) },
            ],
            edges: vec![EdgeDescriptor {
                from_node: "height".into(),
                from_port: "out".into(),
                to_node: "norm".into(),
                to_port: "in".into(),
            }],
            sinks: vec![SinkDescriptor { name: "heightMap".into(), node: "norm".into(), port: "out".into() }],
        };
        let mut registry = NodeRegistry::new();
        register_defaults(&mut registry).unwrap();
        let sinks = execute(&graph, &registry, &ctx()).unwrap();
        assert!(sinks.contains_key("heightMap"));
    }

    #[test]
    fn unknown_node_kind_is_logged_and_skipped() {
        // An unknown kind with no downstream consumers executes exactly
        // like a node that has no outgoing edges (spec.md §4.1, §8).
        let graph = GraphDescriptor {
            nodes: vec![NodeDescriptor { id: "a".into(), kind: "nonexistent".into(), params: serde_json::json!({}) }],
            edges: vec![],
            sinks: vec![],
        };
        let registry = NodeRegistry::new();
        let sinks = execute(&graph, &registry, &ctx()).unwrap();
        assert!(sinks.is_empty());
    }

    #[test]
    fn downstream_input_of_unknown_kind_is_absent_not_fatal() {
        let graph = GraphDescriptor {
            nodes: vec![
                NodeDescriptor { id: "a".into(), kind: "nonexistent".into(), params: serde_json::json!({}) },
                NodeDescriptor { id: "norm".into(), kind: "normalize".into(), params: serde_json::json!({}) },
            ],
            edges: vec![EdgeDescriptor {
                from_node: "a".into(),
                from_port: "out".into(),
                to_node: "norm".into(),
                to_port: "in".into(),
            }],
            sinks: vec![],
        };
        let mut registry = NodeRegistry::new();
        register_defaults(&mut registry).unwrap();
        // "normalize" required its "in" port and never got it, since "a"
        // produced no outputs -> MissingInputError, not a registry error.
        let err = execute(&graph, &registry, &ctx()).unwrap_err();
        assert!(matches!(err, Error::NodeFailure { ref kind, .. } if kind == "normalize"));
    }
}
