//! The node execution contract.

use std::collections::HashMap;

use crate::core::Result;
use crate::graph::port::PortValue;

/// Parameters shared by every node invocation: the raster extent the graph
/// is being evaluated at, and the world seed for deterministic node kinds.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext {
    pub width: usize,
    pub height: usize,
    pub world_seed: u64,
    /// Origin of this raster in world-column space, used by node kinds that
    /// sample continuous noise fields so adjacent regions tile seamlessly.
    pub origin_x: i64,
    pub origin_z: i64,
}

/// A single stage in a terrain-generation graph.
///
/// Implementations are stateless: all per-invocation configuration arrives
/// through `params`, so one registered instance serves every node of that
/// kind across a graph.
pub trait Node: Send + Sync {
    fn process(
        &self,
        inputs: &HashMap<String, PortValue>,
        params: &serde_json::Value,
        ctx: &NodeContext,
    ) -> Result<HashMap<String, PortValue>>;
}

pub(crate) fn param_f32(params: &serde_json::Value, key: &str, default: f32) -> f32 {
    params.get(key).and_then(|v| v.as_f64()).map(|v| v as f32).unwrap_or(default)
}

pub(crate) fn param_u32(params: &serde_json::Value, key: &str, default: u32) -> u32 {
    params.get(key).and_then(|v| v.as_u64()).map(|v| v as u32).unwrap_or(default)
}
