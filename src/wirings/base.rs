use std::fmt;
use std::ops::Range;

use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::BoundWiring;
use crate::error::{NcpError, Result};

/// The group a neuron belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeuronType {
    Sensory,
    Inter,
    Command,
    Motor,
}

impl NeuronType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeuronType::Sensory => "sensory",
            NeuronType::Inter => "inter",
            NeuronType::Command => "command",
            NeuronType::Motor => "motor",
        }
    }
}

impl fmt::Display for NeuronType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sizes of the internal neuron groups.
///
/// Internal IDs are laid out as `[motor | command | inter]`, so group
/// membership follows from the ID alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuronGroups {
    pub inter: usize,
    pub command: usize,
    pub motor: usize,
}

impl NeuronGroups {
    pub fn units(&self) -> usize {
        self.inter + self.command + self.motor
    }

    pub fn motor_range(&self) -> Range<usize> {
        0..self.motor
    }

    pub fn command_range(&self) -> Range<usize> {
        self.motor..self.motor + self.command
    }

    pub fn inter_range(&self) -> Range<usize> {
        self.motor + self.command..self.units()
    }

    /// Type of an internal neuron, derived from its ID range
    pub fn type_of(&self, neuron_id: usize) -> NeuronType {
        if neuron_id < self.motor {
            NeuronType::Motor
        } else if neuron_id < self.motor + self.command {
            NeuronType::Command
        } else {
            NeuronType::Inter
        }
    }
}

/// An unbound wiring definition.
///
/// Implementors describe how to wire a circuit; the synapses themselves only
/// exist in the [`BoundWiring`] returned by [`Wiring::bind`], once the number
/// of input features is known.
pub trait Wiring: Send + Sync + fmt::Debug {
    /// Number of internal neurons
    fn units(&self) -> usize;

    /// Number of motor (output) neurons
    fn output_dim(&self) -> usize;

    fn groups(&self) -> NeuronGroups;

    fn type_of_neuron(&self, neuron_id: usize) -> NeuronType {
        self.groups().type_of(neuron_id)
    }

    /// Build the synapse graph for `input_dim` sensory neurons.
    ///
    /// Binding is deterministic: calling it twice with the same width yields
    /// identical adjacency matrices.
    fn bind(&self, input_dim: usize) -> Result<BoundWiring>;
}

/// Mutable synapse recorder used while a wiring is being built.
///
/// Adding a synapse twice on the same `(src, dest)` pair overwrites the
/// previous polarity.
#[derive(Clone, Debug)]
pub struct SynapseBuilder {
    units: usize,
    input_dim: Option<usize>,
    adjacency_matrix: Array2<i32>,
    sensory_adjacency_matrix: Option<Array2<i32>>,
}

impl SynapseBuilder {
    /// Empty recorder for `units` internal neurons; the sensory width is set later
    pub fn new(units: usize) -> Self {
        Self {
            units,
            input_dim: None,
            adjacency_matrix: Array2::zeros((units, units)),
            sensory_adjacency_matrix: None,
        }
    }

    /// Number of internal neurons
    pub fn units(&self) -> usize {
        self.units
    }

    /// Number of sensory neurons, once known
    pub fn input_dim(&self) -> Option<usize> {
        self.input_dim
    }

    /// Bind the number of sensory neurons; a second call must agree with the first
    pub fn set_input_dim(&mut self, input_dim: usize) -> Result<()> {
        if let Some(existing) = self.input_dim {
            if existing != input_dim {
                return Err(NcpError::ConflictingInputDim {
                    expected: existing,
                    actual: input_dim,
                });
            }
            return Ok(());
        }
        if input_dim == 0 {
            return Err(NcpError::EmptyInput);
        }
        self.input_dim = Some(input_dim);
        self.sensory_adjacency_matrix = Some(Array2::zeros((input_dim, self.units)));
        Ok(())
    }

    /// Record an internal synapse `src -> dest` with polarity `-1` or `+1`
    pub fn add_synapse(&mut self, src: usize, dest: usize, polarity: i32) -> Result<()> {
        if src >= self.units || dest >= self.units {
            return Err(NcpError::SynapseOutOfRange {
                src,
                dest,
                src_limit: self.units,
                dest_limit: self.units,
            });
        }
        check_polarity(polarity)?;
        self.adjacency_matrix[[src, dest]] = polarity;
        Ok(())
    }

    /// Record a synapse from sensory neuron `src` to internal neuron `dest`
    pub fn add_sensory_synapse(&mut self, src: usize, dest: usize, polarity: i32) -> Result<()> {
        let units = self.units;
        let (input_dim, matrix) = match (self.input_dim, self.sensory_adjacency_matrix.as_mut()) {
            (Some(input_dim), Some(matrix)) => (input_dim, matrix),
            _ => return Err(NcpError::SensoryWidthUnknown),
        };
        if src >= input_dim || dest >= units {
            return Err(NcpError::SynapseOutOfRange {
                src,
                dest,
                src_limit: input_dim,
                dest_limit: units,
            });
        }
        check_polarity(polarity)?;
        matrix[[src, dest]] = polarity;
        Ok(())
    }

    /// Signed `[units, units]` internal adjacency recorded so far
    pub fn adjacency_matrix(&self) -> &Array2<i32> {
        &self.adjacency_matrix
    }

    /// Signed `[input_dim, units]` sensory adjacency, once the width is known
    pub fn sensory_adjacency_matrix(&self) -> Option<&Array2<i32>> {
        self.sensory_adjacency_matrix.as_ref()
    }

    /// Freeze the recorded synapses into a [`BoundWiring`]
    pub fn finish(self, groups: NeuronGroups) -> Result<BoundWiring> {
        if groups.units() != self.units {
            return Err(NcpError::InvalidConfig(format!(
                "neuron groups cover {} units but the builder has {}",
                groups.units(),
                self.units
            )));
        }
        let sensory = self
            .sensory_adjacency_matrix
            .ok_or(NcpError::SensoryWidthUnknown)?;
        Ok(BoundWiring::from_parts(groups, self.adjacency_matrix, sensory))
    }
}

fn check_polarity(polarity: i32) -> Result<()> {
    if polarity == -1 || polarity == 1 {
        Ok(())
    } else {
        Err(NcpError::InvalidPolarity(polarity))
    }
}

/// Fully connected wiring structure
///
/// Every neuron (and every sensory input) projects to every neuron. About a
/// third of the synapses are inhibitory.
#[derive(Clone, Debug)]
pub struct FullyConnected {
    units: usize,
    output_dim: usize,
    erev_init_seed: u64,
    self_connections: bool,
}

impl FullyConnected {
    /// Create a fully connected wiring definition
    ///
    /// # Arguments
    /// * `units` - Number of internal neurons
    /// * `output_dim` - Motor neurons, all units when `None`
    /// * `erev_init_seed` - Seed for the synapse polarities
    /// * `self_connections` - Whether neurons synapse onto themselves
    pub fn new(
        units: usize,
        output_dim: Option<usize>,
        erev_init_seed: u64,
        self_connections: bool,
    ) -> Result<Self> {
        let output_dim = output_dim.unwrap_or(units);
        if output_dim == 0 {
            return Err(NcpError::EmptyGroup {
                group: NeuronType::Motor,
            });
        }
        if output_dim > units {
            return Err(NcpError::OutputDimTooLarge { output_dim, units });
        }
        Ok(Self {
            units,
            output_dim,
            erev_init_seed,
            self_connections,
        })
    }
}

fn random_polarity<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    if rng.gen::<f64>() < 0.33 {
        -1
    } else {
        1
    }
}

impl Wiring for FullyConnected {
    fn units(&self) -> usize {
        self.units
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn groups(&self) -> NeuronGroups {
        NeuronGroups {
            inter: self.units - self.output_dim,
            command: 0,
            motor: self.output_dim,
        }
    }

    fn bind(&self, input_dim: usize) -> Result<BoundWiring> {
        let mut synapses = SynapseBuilder::new(self.units);
        synapses.set_input_dim(input_dim)?;
        let mut rng = StdRng::seed_from_u64(self.erev_init_seed);

        for src in 0..self.units {
            for dest in 0..self.units {
                if src == dest && !self.self_connections {
                    continue;
                }
                synapses.add_synapse(src, dest, random_polarity(&mut rng))?;
            }
        }
        for src in 0..input_dim {
            for dest in 0..self.units {
                synapses.add_sensory_synapse(src, dest, random_polarity(&mut rng))?;
            }
        }
        debug!(
            units = self.units,
            input_dim, "bound fully connected wiring"
        );
        synapses.finish(self.groups())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_partition_ids() {
        let groups = NeuronGroups {
            inter: 4,
            command: 3,
            motor: 2,
        };
        assert_eq!(groups.units(), 9);
        assert_eq!(groups.motor_range(), 0..2);
        assert_eq!(groups.command_range(), 2..5);
        assert_eq!(groups.inter_range(), 5..9);
        assert_eq!(groups.type_of(1), NeuronType::Motor);
        assert_eq!(groups.type_of(2), NeuronType::Command);
        assert_eq!(groups.type_of(8), NeuronType::Inter);
    }

    #[test]
    fn test_sensory_synapse_needs_width() {
        let mut synapses = SynapseBuilder::new(5);
        assert_eq!(
            synapses.add_sensory_synapse(0, 1, 1),
            Err(NcpError::SensoryWidthUnknown)
        );
        synapses.set_input_dim(3).unwrap();
        synapses.add_sensory_synapse(2, 4, -1).unwrap();
        assert_eq!(synapses.sensory_adjacency_matrix().unwrap()[[2, 4]], -1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut synapses = SynapseBuilder::new(3);
        synapses.add_synapse(0, 1, 1).unwrap();
        synapses.add_synapse(0, 1, -1).unwrap();
        assert_eq!(synapses.adjacency_matrix()[[0, 1]], -1);
        assert_eq!(synapses.adjacency_matrix().iter().filter(|&&x| x != 0).count(), 1);
    }

    #[test]
    fn test_rejected_synapse_leaves_matrix_untouched() {
        let mut synapses = SynapseBuilder::new(3);
        synapses.add_synapse(0, 1, 1).unwrap();
        let before = synapses.adjacency_matrix().clone();

        assert!(matches!(
            synapses.add_synapse(0, 3, 1),
            Err(NcpError::SynapseOutOfRange { .. })
        ));
        assert_eq!(synapses.add_synapse(0, 1, 0), Err(NcpError::InvalidPolarity(0)));
        assert_eq!(synapses.add_synapse(2, 2, 2), Err(NcpError::InvalidPolarity(2)));
        assert_eq!(synapses.adjacency_matrix(), &before);
    }

    #[test]
    fn test_set_input_dim_conflict() {
        let mut synapses = SynapseBuilder::new(3);
        synapses.set_input_dim(4).unwrap();
        synapses.set_input_dim(4).unwrap();
        assert_eq!(
            synapses.set_input_dim(5),
            Err(NcpError::ConflictingInputDim {
                expected: 4,
                actual: 5
            })
        );
    }

    #[test]
    fn test_fully_connected_without_self_connections() {
        let wiring = FullyConnected::new(4, Some(2), 1234, false).unwrap();
        let bound = wiring.bind(3).unwrap();
        for i in 0..4 {
            assert_eq!(bound.adjacency_matrix()[[i, i]], 0);
        }
        assert_eq!(bound.synapse_count(), 12);
        assert_eq!(bound.sensory_synapse_count(), 12);
    }
}
