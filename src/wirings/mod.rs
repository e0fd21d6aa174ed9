use serde::{Deserialize, Serialize};

mod base;
mod bound;
mod graph;
mod ncp;

pub use base::{FullyConnected, NeuronGroups, NeuronType, SynapseBuilder, Wiring};
pub use bound::BoundWiring;
pub use graph::{GraphEdge, GraphNode, NodeId, Polarity, WiringGraph};
pub use ncp::{DEFAULT_SEED, NCP};

/// Configuration struct for serialization/deserialization of bound wirings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiringConfig {
    pub groups: NeuronGroups,
    pub input_dim: usize,
    pub adjacency_matrix: Vec<Vec<i32>>,
    pub sensory_adjacency_matrix: Vec<Vec<i32>>,
}
