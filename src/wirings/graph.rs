//! Read-only graph view of a bound wiring, for drawing or analysis tools.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NeuronType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Excitatory,
    Inhibitory,
}

impl Polarity {
    /// Non-negative values are excitatory
    pub fn from_sign(value: f32) -> Self {
        if value >= 0.0 {
            Polarity::Excitatory
        } else {
            Polarity::Inhibitory
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Excitatory => f.write_str("excitatory"),
            Polarity::Inhibitory => f.write_str("inhibitory"),
        }
    }
}

/// Sensory inputs and internal neurons live in separate ID spaces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    Sensory(usize),
    Neuron(usize),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Sensory(i) => write!(f, "sensory_{i}"),
            NodeId::Neuron(i) => write!(f, "neuron_{i}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub neuron_type: NeuronType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub src: NodeId,
    pub dest: NodeId,
    pub polarity: Polarity,
}

/// Typed nodes and signed edges of a wiring
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WiringGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl WiringGraph {
    pub(crate) fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn nodes_of_type(&self, neuron_type: NeuronType) -> impl Iterator<Item = &GraphNode> {
        self.nodes
            .iter()
            .filter(move |node| node.neuron_type == neuron_type)
    }

    pub fn edges_from(&self, id: NodeId) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |edge| edge.src == id)
    }

    pub fn edges_into(&self, id: NodeId) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |edge| edge.dest == id)
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.edges_from(id).count()
    }

    pub fn in_degree(&self, id: NodeId) -> usize {
        self.edges_into(id).count()
    }
}
