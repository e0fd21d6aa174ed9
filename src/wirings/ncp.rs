use rand::prelude::*;
use tracing::{debug, info};

use super::base::{NeuronGroups, NeuronType, SynapseBuilder, Wiring};
use super::BoundWiring;
use crate::error::{NcpError, Result};

/// Seed used when none is given
pub const DEFAULT_SEED: u64 = 22222;

/// Neural Circuit Policy wiring structure
///
/// Implements a 4-layer architecture: sensory -> inter -> command -> motor,
/// with a few recurrent synapses among the command neurons. Every neuron is
/// guaranteed to be reachable once the wiring is bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NCP {
    num_inter_neurons: usize,
    num_command_neurons: usize,
    num_motor_neurons: usize,
    sensory_fanout: usize,
    inter_fanout: usize,
    recurrent_command_synapses: usize,
    motor_fanin: usize,
    seed: u64,
}

impl NCP {
    /// Create an NCP definition; synapses are drawn later by [`Wiring::bind`]
    ///
    /// # Arguments
    /// * `inter_neurons` - Neurons receiving the sensory synapses
    /// * `command_neurons` - Neurons between the inter and motor layers
    /// * `motor_neurons` - Output neurons
    /// * `sensory_fanout` - Inter neurons each sensory neuron connects to
    /// * `inter_fanout` - Command neurons each inter neuron connects to
    /// * `recurrent_command_synapses` - Random synapses drawn among command neurons
    /// * `motor_fanin` - Command neurons feeding each motor neuron
    /// * `seed` - Seed of the generator used by every bind
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inter_neurons: usize,
        command_neurons: usize,
        motor_neurons: usize,
        sensory_fanout: usize,
        inter_fanout: usize,
        recurrent_command_synapses: usize,
        motor_fanin: usize,
        seed: u64,
    ) -> Result<Self> {
        if motor_fanin > command_neurons {
            return Err(NcpError::MotorFaninTooLarge {
                motor_fanin,
                command_neurons,
            });
        }
        if sensory_fanout > inter_neurons {
            return Err(NcpError::SensoryFanoutTooLarge {
                sensory_fanout,
                inter_neurons,
            });
        }
        if inter_fanout > command_neurons {
            return Err(NcpError::InterFanoutTooLarge {
                inter_fanout,
                command_neurons,
            });
        }
        for (count, group) in [
            (inter_neurons, NeuronType::Inter),
            (command_neurons, NeuronType::Command),
            (motor_neurons, NeuronType::Motor),
        ] {
            if count == 0 {
                return Err(NcpError::EmptyGroup { group });
            }
        }
        for (fanout, name) in [
            (sensory_fanout, "sensory_fanout"),
            (inter_fanout, "inter_fanout"),
            (motor_fanin, "motor_fanin"),
        ] {
            if fanout == 0 {
                return Err(NcpError::ZeroFanout { name });
            }
        }

        Ok(Self {
            num_inter_neurons: inter_neurons,
            num_command_neurons: command_neurons,
            num_motor_neurons: motor_neurons,
            sensory_fanout,
            inter_fanout,
            recurrent_command_synapses,
            motor_fanin,
            seed,
        })
    }

    /// Number of inter neurons
    pub fn num_inter_neurons(&self) -> usize {
        self.num_inter_neurons
    }

    /// Number of command neurons
    pub fn num_command_neurons(&self) -> usize {
        self.num_command_neurons
    }

    /// Number of motor (output) neurons
    pub fn num_motor_neurons(&self) -> usize {
        self.num_motor_neurons
    }

    /// Inter neurons targeted by each sensory neuron
    pub fn sensory_fanout(&self) -> usize {
        self.sensory_fanout
    }

    /// Command neurons targeted by each inter neuron
    pub fn inter_fanout(&self) -> usize {
        self.inter_fanout
    }

    /// Number of recurrent draws among command neurons
    pub fn recurrent_command_synapses(&self) -> usize {
        self.recurrent_command_synapses
    }

    /// Command neurons feeding each motor neuron
    pub fn motor_fanin(&self) -> usize {
        self.motor_fanin
    }

    /// Seed of the wiring generator
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn build_sensory_to_inter_layer<R: Rng + ?Sized>(
        &self,
        synapses: &mut SynapseBuilder,
        rng: &mut R,
    ) -> Result<()> {
        let input_dim = synapses
            .input_dim()
            .ok_or(NcpError::SensoryWidthUnknown)?;
        let sensory_neurons: Vec<usize> = (0..input_dim).collect();
        let inter_neurons: Vec<usize> = self.groups().inter_range().collect();
        let mut unreachable_inter = inter_neurons.clone();

        // Connect each sensory neuron to exactly sensory_fanout inter neurons
        for &src in &sensory_neurons {
            let selected: Vec<usize> = inter_neurons
                .choose_multiple(rng, self.sensory_fanout)
                .copied()
                .collect();
            for dest in selected {
                remove_first(&mut unreachable_inter, dest);
                synapses.add_sensory_synapse(src, dest, random_polarity(rng))?;
            }
        }

        // Connect any unreachable inter neurons
        let mean_inter_fanin = (input_dim * self.sensory_fanout / self.num_inter_neurons)
            .max(1)
            .min(input_dim);
        for &dest in &unreachable_inter {
            let selected: Vec<usize> = sensory_neurons
                .choose_multiple(rng, mean_inter_fanin)
                .copied()
                .collect();
            for src in selected {
                synapses.add_sensory_synapse(src, dest, random_polarity(rng))?;
            }
        }

        debug!(
            repaired = unreachable_inter.len(),
            fanin = mean_inter_fanin,
            "built sensory -> inter layer"
        );
        Ok(())
    }

    fn build_inter_to_command_layer<R: Rng + ?Sized>(
        &self,
        synapses: &mut SynapseBuilder,
        rng: &mut R,
    ) -> Result<()> {
        let inter_neurons: Vec<usize> = self.groups().inter_range().collect();
        let command_neurons: Vec<usize> = self.groups().command_range().collect();
        let mut unreachable_command = command_neurons.clone();

        for &src in &inter_neurons {
            let selected: Vec<usize> = command_neurons
                .choose_multiple(rng, self.inter_fanout)
                .copied()
                .collect();
            for dest in selected {
                remove_first(&mut unreachable_command, dest);
                synapses.add_synapse(src, dest, random_polarity(rng))?;
            }
        }

        // Upper bound is the command count; the fanin never exceeds the inter
        // count because inter_fanout <= command count.
        let mean_command_fanin = (self.num_inter_neurons * self.inter_fanout
            / self.num_command_neurons)
            .max(1)
            .min(self.num_command_neurons);
        for &dest in &unreachable_command {
            let selected: Vec<usize> = inter_neurons
                .choose_multiple(rng, mean_command_fanin)
                .copied()
                .collect();
            for src in selected {
                synapses.add_synapse(src, dest, random_polarity(rng))?;
            }
        }

        debug!(
            repaired = unreachable_command.len(),
            fanin = mean_command_fanin,
            "built inter -> command layer"
        );
        Ok(())
    }

    fn build_recurrent_command_layer<R: Rng + ?Sized>(
        &self,
        synapses: &mut SynapseBuilder,
        rng: &mut R,
    ) -> Result<()> {
        let command_neurons: Vec<usize> = self.groups().command_range().collect();
        let empty = NcpError::EmptyGroup {
            group: NeuronType::Command,
        };
        for _ in 0..self.recurrent_command_synapses {
            let src = *command_neurons.choose(rng).ok_or_else(|| empty.clone())?;
            let dest = *command_neurons.choose(rng).ok_or_else(|| empty.clone())?;
            synapses.add_synapse(src, dest, random_polarity(rng))?;
        }

        debug!(
            synapses = self.recurrent_command_synapses,
            "built recurrent command layer"
        );
        Ok(())
    }

    fn build_command_to_motor_layer<R: Rng + ?Sized>(
        &self,
        synapses: &mut SynapseBuilder,
        rng: &mut R,
    ) -> Result<()> {
        let motor_neurons: Vec<usize> = self.groups().motor_range().collect();
        let command_neurons: Vec<usize> = self.groups().command_range().collect();
        let mut unreachable_command = command_neurons.clone();

        // Every motor neuron receives exactly motor_fanin command synapses
        for &dest in &motor_neurons {
            let selected: Vec<usize> = command_neurons
                .choose_multiple(rng, self.motor_fanin)
                .copied()
                .collect();
            for src in selected {
                remove_first(&mut unreachable_command, src);
                synapses.add_synapse(src, dest, random_polarity(rng))?;
            }
        }

        // Connect any command neuron that does not drive a motor neuron yet
        let mean_command_fanout = (self.num_motor_neurons * self.motor_fanin
            / self.num_command_neurons)
            .max(1)
            .min(self.num_motor_neurons);
        for &src in &unreachable_command {
            let selected: Vec<usize> = motor_neurons
                .choose_multiple(rng, mean_command_fanout)
                .copied()
                .collect();
            for dest in selected {
                synapses.add_synapse(src, dest, random_polarity(rng))?;
            }
        }

        debug!(
            repaired = unreachable_command.len(),
            fanout = mean_command_fanout,
            "built command -> motor layer"
        );
        Ok(())
    }
}

/// Removes `neuron` from the pool the first time any synapse touches it
fn remove_first(pool: &mut Vec<usize>, neuron: usize) {
    if let Some(pos) = pool.iter().position(|&x| x == neuron) {
        pool.remove(pos);
    }
}

fn random_polarity<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    if rng.gen::<bool>() {
        1
    } else {
        -1
    }
}

impl Wiring for NCP {
    fn units(&self) -> usize {
        self.num_inter_neurons + self.num_command_neurons + self.num_motor_neurons
    }

    fn output_dim(&self) -> usize {
        self.num_motor_neurons
    }

    fn groups(&self) -> NeuronGroups {
        NeuronGroups {
            inter: self.num_inter_neurons,
            command: self.num_command_neurons,
            motor: self.num_motor_neurons,
        }
    }

    fn bind(&self, input_dim: usize) -> Result<BoundWiring> {
        let mut synapses = SynapseBuilder::new(self.units());
        synapses.set_input_dim(input_dim)?;

        // One generator per bind, consumed by the passes in this fixed order
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.build_sensory_to_inter_layer(&mut synapses, &mut rng)?;
        self.build_inter_to_command_layer(&mut synapses, &mut rng)?;
        self.build_recurrent_command_layer(&mut synapses, &mut rng)?;
        self.build_command_to_motor_layer(&mut synapses, &mut rng)?;

        let bound = synapses.finish(self.groups())?;
        info!(
            units = bound.units(),
            input_dim,
            synapses = bound.synapse_count(),
            sensory_synapses = bound.sensory_synapse_count(),
            seed = self.seed,
            "bound NCP wiring"
        );
        Ok(bound)
    }
}
