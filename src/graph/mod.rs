//! Node-graph terrain generation: a registry of stateless node kinds, a
//! JSON graph descriptor format, and an executor that topologically sorts
//! and runs a graph to produce named raster outputs.

pub mod builtin;
pub mod descriptor;
pub mod executor;
pub mod node;
pub mod port;
pub mod registry;

pub use descriptor::{EdgeDescriptor, GraphDescriptor, NodeDescriptor, SinkDescriptor};
pub use executor::{execute, topo_sort};
pub use node::{Node, NodeContext};
pub use port::{PortKind, PortValue, RasterF32, RasterGradient, RasterU16, RasterU8};
pub use registry::NodeRegistry;
