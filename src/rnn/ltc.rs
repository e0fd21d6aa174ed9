//! Liquid Time-Constant (LTC) RNN Layer
//!
//! Runs an [`LTCCell`] over whole sequences, threading each step's next
//! state back in as the previous state of the following step.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::cells::{Constrained, LTCCell, LTCCellConfig};
use crate::error::{NcpError, Result};
use crate::wirings::{Wiring, DEFAULT_SEED, NCP};

/// Configuration of an [`LTC`] layer
#[derive(Clone, Debug)]
pub struct LTCConfig<W: Wiring> {
    wiring: W,
    cell: LTCCellConfig,
    batch_first: bool,
    return_sequences: bool,
}

impl<W: Wiring> LTCConfig<W> {
    /// Layer configuration with default cell options, batch-first input
    /// and the full output sequence
    ///
    /// # Arguments
    /// * `wiring` - Unbound wiring, bound to the input width in [`init`](Self::init)
    pub fn new(wiring: W) -> Self {
        Self {
            wiring,
            cell: LTCCellConfig::default(),
            batch_first: true,
            return_sequences: true,
        }
    }

    /// Replace the cell options (mapping modes, solver settings, init ranges)
    pub fn with_cell_config(mut self, cell: LTCCellConfig) -> Self {
        self.cell = cell;
        self
    }

    /// When true (default) input is `[batch, seq, features]`, otherwise
    /// `[seq, batch, features]`
    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    /// When false only the last output is returned, as `[batch, 1, motor_size]`
    pub fn with_return_sequences(mut self, return_sequences: bool) -> Self {
        self.return_sequences = return_sequences;
        self
    }

    pub fn wiring(&self) -> &W {
        &self.wiring
    }

    pub fn cell_config(&self) -> &LTCCellConfig {
        &self.cell
    }

    /// Bind the wiring to `input_size` features and allocate the cell
    ///
    /// # Arguments
    /// * `input_size` - Number of input features
    /// * `device` - Device to create the module on
    pub fn init<B: Backend>(&self, input_size: usize, device: &B::Device) -> Result<LTC<B>> {
        self.cell.validate()?;
        let bound = self.wiring.bind(input_size)?;
        let cell = self.cell.init(bound, device)?;
        Ok(LTC {
            cell,
            batch_first: self.batch_first,
            return_sequences: self.return_sequences,
        })
    }
}

impl LTCConfig<NCP> {
    /// NCP sizes used by the benchmark model factory: 32 inter, 16 command,
    /// sensory and inter fanout 4, 8 recurrent synapses, motor fanin 6
    pub fn factory_preset(motor_neurons: usize) -> Result<Self> {
        let wiring = NCP::new(32, 16, motor_neurons, 4, 4, 8, 6, DEFAULT_SEED)?;
        Ok(Self::new(wiring))
    }
}

/// LTC RNN Layer
#[derive(Module, Debug)]
pub struct LTC<B: Backend> {
    cell: LTCCell<B>,
    #[module(skip)]
    batch_first: bool,
    #[module(skip)]
    return_sequences: bool,
}

impl<B: Backend> LTC<B> {
    /// Number of input features
    pub fn input_size(&self) -> usize {
        self.cell.sensory_size()
    }

    /// Width of the hidden state (all neurons)
    pub fn state_size(&self) -> usize {
        self.cell.state_size()
    }

    /// Width of each output step
    pub fn motor_size(&self) -> usize {
        self.cell.motor_size()
    }

    pub fn cell(&self) -> &LTCCell<B> {
        &self.cell
    }

    /// See [`LTCCell::apply_constraints`]; [`constrained_step`](crate::cells::constrained_step)
    /// runs it after every optimizer update
    pub fn apply_constraints(mut self) -> Self {
        self.cell = self.cell.apply_constraints();
        self
    }

    /// Forward pass over a sequence
    ///
    /// `state` defaults to zeros of shape `[batch, state_size]`. Returns the
    /// outputs (`[batch, seq, motor_size]`, or `[batch, 1, motor_size]` when
    /// only the last step is kept) and the final state.
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<Tensor<B, 2>>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 2>)> {
        let [d0, d1, features] = input.dims();
        let (batch_size, seq_len) = if self.batch_first { (d0, d1) } else { (d1, d0) };
        self.cell.wiring().ensure_input_dim(features)?;
        if seq_len == 0 {
            return Err(NcpError::EmptySequence);
        }

        let device = input.device();
        let expected = [batch_size, self.state_size()];
        let mut current_state = match state {
            Some(state) if state.dims() != expected => {
                return Err(NcpError::StateShapeMismatch {
                    expected,
                    actual: state.dims(),
                })
            }
            Some(state) => state,
            None => Tensor::zeros(expected, &device),
        };

        let mut outputs: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);
        for t in 0..seq_len {
            let time_axis = if self.batch_first { 1 } else { 0 };
            let step_input = input
                .clone()
                .narrow(time_axis, t, 1)
                .reshape([batch_size, features]);

            let (output, next_state) = self.cell.forward(step_input, current_state);
            current_state = next_state;

            if self.return_sequences || t == seq_len - 1 {
                outputs.push(output);
            }
        }

        Ok((Tensor::stack(outputs, 1), current_state))
    }
}

impl<B: Backend> Constrained for LTC<B> {
    fn apply_constraints(self) -> Self {
        LTC::apply_constraints(self)
    }
}
