use ndarray::Array2;

use super::graph::{GraphEdge, GraphNode, NodeId, Polarity, WiringGraph};
use super::{NeuronGroups, NeuronType, WiringConfig};
use crate::error::{NcpError, Result};

/// A wiring whose synapses have been built for a known input width.
///
/// The adjacency matrices are frozen: nothing on this type mutates them.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundWiring {
    groups: NeuronGroups,
    input_dim: usize,
    adjacency_matrix: Array2<i32>,
    sensory_adjacency_matrix: Array2<i32>,
}

impl BoundWiring {
    pub(crate) fn from_parts(
        groups: NeuronGroups,
        adjacency_matrix: Array2<i32>,
        sensory_adjacency_matrix: Array2<i32>,
    ) -> Self {
        let input_dim = sensory_adjacency_matrix.nrows();
        Self {
            groups,
            input_dim,
            adjacency_matrix,
            sensory_adjacency_matrix,
        }
    }

    pub fn units(&self) -> usize {
        self.groups.units()
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.groups.motor
    }

    pub fn groups(&self) -> NeuronGroups {
        self.groups
    }

    /// Fails if `input_dim` differs from the width this wiring was bound to
    pub fn ensure_input_dim(&self, input_dim: usize) -> Result<()> {
        if input_dim != self.input_dim {
            return Err(NcpError::ConflictingInputDim {
                expected: self.input_dim,
                actual: input_dim,
            });
        }
        Ok(())
    }

    /// Layered wirings (with command neurons) have inter, command and motor layers
    pub fn num_layers(&self) -> usize {
        if self.groups.command > 0 {
            3
        } else {
            1
        }
    }

    pub fn neurons_of_layer(&self, layer_id: usize) -> Result<Vec<usize>> {
        match (self.num_layers(), layer_id) {
            (1, 0) => Ok((0..self.units()).collect()),
            (3, 0) => Ok(self.groups.inter_range().collect()),
            (3, 1) => Ok(self.groups.command_range().collect()),
            (3, 2) => Ok(self.groups.motor_range().collect()),
            _ => Err(NcpError::UnknownLayer(layer_id)),
        }
    }

    pub fn type_of_neuron(&self, neuron_id: usize) -> NeuronType {
        self.groups.type_of(neuron_id)
    }

    /// Synapses between internal neurons, indexed `[src, dest]`
    pub fn adjacency_matrix(&self) -> &Array2<i32> {
        &self.adjacency_matrix
    }

    /// Synapses from sensory inputs to internal neurons, indexed `[src, dest]`
    pub fn sensory_adjacency_matrix(&self) -> &Array2<i32> {
        &self.sensory_adjacency_matrix
    }

    /// Initial reversal potentials of internal synapses
    pub fn erev_initializer(&self) -> Array2<f32> {
        self.adjacency_matrix.mapv(|x| x as f32)
    }

    /// Initial reversal potentials of sensory synapses
    pub fn sensory_erev_initializer(&self) -> Array2<f32> {
        self.sensory_adjacency_matrix.mapv(|x| x as f32)
    }

    pub fn synapse_count(&self) -> usize {
        self.adjacency_matrix.iter().filter(|&&x| x != 0).count()
    }

    pub fn sensory_synapse_count(&self) -> usize {
        self.sensory_adjacency_matrix
            .iter()
            .filter(|&&x| x != 0)
            .count()
    }

    /// Graph view with edge polarity taken from the adjacency matrices
    pub fn graph(&self) -> WiringGraph {
        self.graph_with_polarity(
            |src, dest| Polarity::from_sign(self.adjacency_matrix[[src, dest]] as f32),
            |src, dest| Polarity::from_sign(self.sensory_adjacency_matrix[[src, dest]] as f32),
        )
    }

    /// Graph view where the polarity of each existing synapse is decided by
    /// the given callbacks, e.g. from trained reversal potentials.
    pub(crate) fn graph_with_polarity<F, G>(&self, internal: F, sensory: G) -> WiringGraph
    where
        F: Fn(usize, usize) -> Polarity,
        G: Fn(usize, usize) -> Polarity,
    {
        let mut nodes = Vec::with_capacity(self.units() + self.input_dim);
        for i in 0..self.units() {
            nodes.push(GraphNode {
                id: NodeId::Neuron(i),
                neuron_type: self.type_of_neuron(i),
            });
        }
        for i in 0..self.input_dim {
            nodes.push(GraphNode {
                id: NodeId::Sensory(i),
                neuron_type: NeuronType::Sensory,
            });
        }

        let mut edges = Vec::new();
        for ((src, dest), &value) in self.sensory_adjacency_matrix.indexed_iter() {
            if value != 0 {
                edges.push(GraphEdge {
                    src: NodeId::Sensory(src),
                    dest: NodeId::Neuron(dest),
                    polarity: sensory(src, dest),
                });
            }
        }
        for ((src, dest), &value) in self.adjacency_matrix.indexed_iter() {
            if value != 0 {
                edges.push(GraphEdge {
                    src: NodeId::Neuron(src),
                    dest: NodeId::Neuron(dest),
                    polarity: internal(src, dest),
                });
            }
        }
        WiringGraph::new(nodes, edges)
    }

    /// Create a serialization config for this wiring
    pub fn config(&self) -> WiringConfig {
        WiringConfig {
            groups: self.groups,
            input_dim: self.input_dim,
            adjacency_matrix: self
                .adjacency_matrix
                .outer_iter()
                .map(|row| row.to_vec())
                .collect(),
            sensory_adjacency_matrix: self
                .sensory_adjacency_matrix
                .outer_iter()
                .map(|row| row.to_vec())
                .collect(),
        }
    }

    pub fn from_config(config: WiringConfig) -> Result<Self> {
        let units = config.groups.units();
        let adjacency_matrix = matrix_from_rows(config.adjacency_matrix, units, units)?;
        let sensory_adjacency_matrix =
            matrix_from_rows(config.sensory_adjacency_matrix, config.input_dim, units)?;
        if config.input_dim == 0 {
            return Err(NcpError::EmptyInput);
        }
        Ok(Self::from_parts(
            config.groups,
            adjacency_matrix,
            sensory_adjacency_matrix,
        ))
    }
}

fn matrix_from_rows(rows: Vec<Vec<i32>>, nrows: usize, ncols: usize) -> Result<Array2<i32>> {
    if rows.len() != nrows || rows.iter().any(|row| row.len() != ncols) {
        return Err(NcpError::InvalidConfig(format!(
            "expected a {nrows}x{ncols} adjacency matrix"
        )));
    }
    if let Some(&bad) = rows.iter().flatten().find(|&&x| !(-1..=1).contains(&x)) {
        return Err(NcpError::InvalidConfig(format!(
            "adjacency entry {bad} is not one of -1, 0, 1"
        )));
    }
    Array2::from_shape_vec((nrows, ncols), rows.into_iter().flatten().collect())
        .map_err(|err| NcpError::InvalidConfig(err.to_string()))
}
