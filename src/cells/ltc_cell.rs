//! Liquid Time-Constant (LTC) Cell Implementation
//!
//! Reference: Hasani et al., "Liquid time-constant networks", AAAI 2021

use burn::module::{AutodiffModule, Ignored, Module, Param};
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::activation;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{Distribution, Tensor, TensorData};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::init_ranges::{InitRanges, ParamName};
use crate::error::{NcpError, Result};
use crate::wirings::{BoundWiring, Polarity, WiringGraph};

/// Input/output mapping modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMode {
    /// Affine mapping: y = w * x + b
    #[default]
    Affine,
    /// Linear mapping: y = w * x
    Linear,
    /// No mapping (pass-through)
    None,
}

impl MappingMode {
    fn has_weight(&self) -> bool {
        matches!(self, MappingMode::Affine | MappingMode::Linear)
    }

    fn has_bias(&self) -> bool {
        matches!(self, MappingMode::Affine)
    }
}

/// Options of an LTC cell that do not depend on the input width
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LTCCellConfig {
    pub input_mapping: MappingMode,
    pub output_mapping: MappingMode,
    /// Number of ODE solver sub-steps per forward pass
    pub ode_unfolds: usize,
    /// Added to the denominator of the voltage update
    pub epsilon: f64,
    pub init_ranges: InitRanges,
}

impl Default for LTCCellConfig {
    fn default() -> Self {
        Self {
            input_mapping: MappingMode::Affine,
            output_mapping: MappingMode::Affine,
            ode_unfolds: 6,
            epsilon: 1e-8,
            init_ranges: InitRanges::default(),
        }
    }
}

impl LTCCellConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_mapping(mut self, mode: MappingMode) -> Self {
        self.input_mapping = mode;
        self
    }

    pub fn with_output_mapping(mut self, mode: MappingMode) -> Self {
        self.output_mapping = mode;
        self
    }

    pub fn with_ode_unfolds(mut self, unfolds: usize) -> Self {
        self.ode_unfolds = unfolds;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_init_ranges(mut self, init_ranges: InitRanges) -> Self {
        self.init_ranges = init_ranges;
        self
    }

    /// Override a single initialization range by parameter name
    pub fn with_init_range(mut self, name: &str, range: (f64, f64)) -> Result<Self> {
        self.init_ranges = self.init_ranges.with_range(name, range)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ode_unfolds == 0 {
            return Err(NcpError::InvalidOdeUnfolds);
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(NcpError::InvalidEpsilon(self.epsilon));
        }
        Ok(())
    }

    /// Allocate the parameters of a cell for a bound wiring
    pub fn init<B: Backend>(&self, wiring: BoundWiring, device: &B::Device) -> Result<LTCCell<B>> {
        self.validate()?;
        let ranges = &self.init_ranges;
        let state_size = wiring.units();
        let sensory_size = wiring.input_dim();
        let motor_size = wiring.output_dim();

        let gleak = init_param([state_size], ranges.get(ParamName::Gleak), device);
        let vleak = init_param([state_size], ranges.get(ParamName::Vleak), device);
        let cm = init_param([state_size], ranges.get(ParamName::Cm), device);

        let sigma = init_param([state_size, state_size], ranges.get(ParamName::Sigma), device);
        let mu = init_param([state_size, state_size], ranges.get(ParamName::Mu), device);
        let w = init_param([state_size, state_size], ranges.get(ParamName::W), device);
        // erev encodes the excitatory/inhibitory polarity of each synapse
        let erev = Param::from_tensor(tensor_from_ndarray(&wiring.erev_initializer(), device));

        let sensory_shape = [sensory_size, state_size];
        let sensory_sigma = init_param(sensory_shape, ranges.get(ParamName::SensorySigma), device);
        let sensory_mu = init_param(sensory_shape, ranges.get(ParamName::SensoryMu), device);
        let sensory_w = init_param(sensory_shape, ranges.get(ParamName::SensoryW), device);
        let sensory_erev = Param::from_tensor(tensor_from_ndarray(
            &wiring.sensory_erev_initializer(),
            device,
        ));

        let sparsity_mask = mask_from_adjacency(wiring.adjacency_matrix(), device);
        let sensory_sparsity_mask = mask_from_adjacency(wiring.sensory_adjacency_matrix(), device);

        let (input_w, input_b) = mapping_params(self.input_mapping, sensory_size, device);
        let (output_w, output_b) = mapping_params(self.output_mapping, motor_size, device);

        info!(
            state_size,
            sensory_size,
            motor_size,
            ode_unfolds = self.ode_unfolds,
            synapses = wiring.synapse_count(),
            sensory_synapses = wiring.sensory_synapse_count(),
            "built LTC cell"
        );

        Ok(LTCCell {
            gleak,
            vleak,
            cm,
            sigma,
            mu,
            w,
            erev,
            sensory_sigma,
            sensory_mu,
            sensory_w,
            sensory_erev,
            sparsity_mask,
            sensory_sparsity_mask,
            input_w,
            input_b,
            output_w,
            output_b,
            wiring: Ignored(wiring),
            ode_unfolds: self.ode_unfolds,
            epsilon: self.epsilon,
            input_mapping: Ignored(self.input_mapping),
            output_mapping: Ignored(self.output_mapping),
        })
    }
}

fn init_param<B: Backend, const D: usize>(
    shape: [usize; D],
    (min, max): (f64, f64),
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    let tensor = if min == max {
        Tensor::full(shape, min, device)
    } else {
        Tensor::random(shape, Distribution::Uniform(min, max), device)
    };
    Param::from_tensor(tensor)
}

fn tensor_from_ndarray<B: Backend>(arr: &Array2<f32>, device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = arr.iter().copied().collect();
    Tensor::from_data(TensorData::new(data, [arr.nrows(), arr.ncols()]), device)
}

/// Non-trainable 0/1 mask from the nonzero pattern of an adjacency matrix
fn mask_from_adjacency<B: Backend>(
    adjacency: &Array2<i32>,
    device: &B::Device,
) -> Param<Tensor<B, 2>> {
    let mask = adjacency.mapv(|x| x.abs() as f32);
    Param::from_tensor(tensor_from_ndarray(&mask, device)).set_require_grad(false)
}

type MappingParams<B> = (Option<Param<Tensor<B, 1>>>, Option<Param<Tensor<B, 1>>>);

fn mapping_params<B: Backend>(mode: MappingMode, size: usize, device: &B::Device) -> MappingParams<B> {
    let weight = mode
        .has_weight()
        .then(|| Param::from_tensor(Tensor::ones([size], device)));
    let bias = mode
        .has_bias()
        .then(|| Param::from_tensor(Tensor::zeros([size], device)));
    (weight, bias)
}

/// Liquid Time-Constant (LTC) Cell
///
/// Parameters at positions without a synapse in the wiring are kept but
/// masked out of every update.
#[derive(Debug, Module)]
pub struct LTCCell<B: Backend> {
    /// Leak conductance (non-negative)
    pub gleak: Param<Tensor<B, 1>>,
    /// Leak reversal potential
    pub vleak: Param<Tensor<B, 1>>,
    /// Membrane capacitance (non-negative)
    pub cm: Param<Tensor<B, 1>>,
    /// Sigmoid steepness for internal synapses
    pub sigma: Param<Tensor<B, 2>>,
    /// Sigmoid center for internal synapses
    pub mu: Param<Tensor<B, 2>>,
    /// Synaptic weights for internal synapses (non-negative)
    pub w: Param<Tensor<B, 2>>,
    /// Reversal potentials for internal synapses
    pub erev: Param<Tensor<B, 2>>,
    pub sensory_sigma: Param<Tensor<B, 2>>,
    pub sensory_mu: Param<Tensor<B, 2>>,
    /// Synaptic weights for sensory synapses (non-negative)
    pub sensory_w: Param<Tensor<B, 2>>,
    pub sensory_erev: Param<Tensor<B, 2>>,
    /// Sparsity mask for internal synapses (non-trainable)
    pub sparsity_mask: Param<Tensor<B, 2>>,
    /// Sparsity mask for sensory synapses (non-trainable)
    pub sensory_sparsity_mask: Param<Tensor<B, 2>>,
    pub input_w: Option<Param<Tensor<B, 1>>>,
    pub input_b: Option<Param<Tensor<B, 1>>>,
    pub output_w: Option<Param<Tensor<B, 1>>>,
    pub output_b: Option<Param<Tensor<B, 1>>>,
    wiring: Ignored<BoundWiring>,
    #[module(skip)]
    ode_unfolds: usize,
    #[module(skip)]
    epsilon: f64,
    input_mapping: Ignored<MappingMode>,
    output_mapping: Ignored<MappingMode>,
}

impl<B: Backend> LTCCell<B> {
    /// Number of internal neurons
    pub fn state_size(&self) -> usize {
        self.wiring.units()
    }

    /// Number of motor neurons, i.e. the output width
    pub fn motor_size(&self) -> usize {
        self.wiring.output_dim()
    }

    /// Number of input features
    pub fn sensory_size(&self) -> usize {
        self.wiring.input_dim()
    }

    /// ODE solver sub-steps per forward pass
    pub fn ode_unfolds(&self) -> usize {
        self.ode_unfolds
    }

    /// Stabilizer added to the voltage update denominator
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Mapping applied to the inputs before the ODE solver
    pub fn input_mapping(&self) -> MappingMode {
        self.input_mapping.0
    }

    /// Mapping applied to the motor neurons' state
    pub fn output_mapping(&self) -> MappingMode {
        self.output_mapping.0
    }

    /// The bound wiring the cell was built from
    pub fn wiring(&self) -> &BoundWiring {
        &self.wiring.0
    }

    /// Number of internal synapses
    pub fn synapse_count(&self) -> usize {
        self.wiring.synapse_count()
    }

    /// Number of sensory synapses
    pub fn sensory_synapse_count(&self) -> usize {
        self.wiring.sensory_synapse_count()
    }

    /// Graph view whose edge polarities follow the sign of the current
    /// (possibly trained) reversal potentials
    pub fn graph(&self) -> WiringGraph {
        let units = self.state_size();
        let erev: Vec<f32> = self.erev.val().into_data().iter::<f32>().collect();
        let sensory_erev: Vec<f32> = self.sensory_erev.val().into_data().iter::<f32>().collect();
        self.wiring.graph_with_polarity(
            |src, dest| Polarity::from_sign(erev[src * units + dest]),
            |src, dest| Polarity::from_sign(sensory_erev[src * units + dest]),
        )
    }

    /// Clamp `gleak`, `cm`, `w` and `sensory_w` at zero.
    ///
    /// Must run after every optimizer update; see [`constrained_step`].
    pub fn apply_constraints(mut self) -> Self {
        self.gleak = non_negative(self.gleak);
        self.cm = non_negative(self.cm);
        self.w = non_negative(self.w);
        self.sensory_w = non_negative(self.sensory_w);
        self
    }

    fn map_inputs(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut inputs = inputs;
        if let Some(w) = &self.input_w {
            inputs = inputs * w.val().unsqueeze::<2>();
        }
        if let Some(b) = &self.input_b {
            inputs = inputs + b.val().unsqueeze::<2>();
        }
        inputs
    }

    fn map_outputs(&self, state: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut output = state;
        if self.motor_size() < self.state_size() {
            output = output.narrow(1, 0, self.motor_size());
        }
        if let Some(w) = &self.output_w {
            output = output * w.val().unsqueeze::<2>();
        }
        if let Some(b) = &self.output_b {
            output = output + b.val().unsqueeze::<2>();
        }
        output
    }

    /// `sigmoid(sigma * (v_pre - mu))` for every `(source, target)` pair.
    ///
    /// `v_pre` is `[batch, sources]`, `mu` and `sigma` are
    /// `[sources, targets]`; the result is `[batch, sources, targets]`.
    fn sigmoid(v_pre: Tensor<B, 2>, mu: Tensor<B, 2>, sigma: Tensor<B, 2>) -> Tensor<B, 3> {
        let [batch, sources] = v_pre.dims();
        let mues = v_pre.reshape([batch, sources, 1]) - mu.unsqueeze::<3>();
        activation::sigmoid(sigma.unsqueeze::<3>() * mues)
    }

    fn ode_solver(&self, inputs: Tensor<B, 2>, state: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, state_size] = state.dims();

        // The sensory contribution does not depend on v_pre
        let sensory_w_activation = self.sensory_w.val().unsqueeze::<3>()
            * Self::sigmoid(inputs, self.sensory_mu.val(), self.sensory_sigma.val())
            * self.sensory_sparsity_mask.val().unsqueeze::<3>();
        let sensory_rev_activation =
            sensory_w_activation.clone() * self.sensory_erev.val().unsqueeze::<3>();

        // Reduce over the source (sensory) axis
        let w_numerator_sensory = sensory_rev_activation
            .sum_dim(1)
            .reshape([batch, state_size]);
        let w_denominator_sensory = sensory_w_activation
            .sum_dim(1)
            .reshape([batch, state_size]);

        let cm_t = self
            .cm
            .val()
            .div_scalar(1.0 / self.ode_unfolds as f64)
            .unsqueeze::<2>();
        let gleak = self.gleak.val().unsqueeze::<2>();
        let leak = (self.gleak.val() * self.vleak.val()).unsqueeze::<2>();
        let w = self.w.val().unsqueeze::<3>();
        let erev = self.erev.val().unsqueeze::<3>();
        let mask = self.sparsity_mask.val().unsqueeze::<3>();
        let mu = self.mu.val();
        let sigma = self.sigma.val();

        let mut v_pre = state;
        for _ in 0..self.ode_unfolds {
            let w_activation =
                w.clone() * Self::sigmoid(v_pre.clone(), mu.clone(), sigma.clone()) * mask.clone();
            let rev_activation = w_activation.clone() * erev.clone();

            let w_numerator =
                rev_activation.sum_dim(1).reshape([batch, state_size]) + w_numerator_sensory.clone();
            let w_denominator = w_activation.sum_dim(1).reshape([batch, state_size])
                + w_denominator_sensory.clone();

            let numerator = cm_t.clone() * v_pre + leak.clone() + w_numerator;
            let denominator = cm_t.clone() + gleak.clone() + w_denominator;

            v_pre = numerator / denominator.add_scalar(self.epsilon);
        }

        v_pre
    }

    /// One recurrence step.
    ///
    /// `inputs` is `[batch, sensory_size]` and `states` is
    /// `[batch, state_size]`; returns `([batch, motor_size], next_state)`.
    pub fn forward(&self, inputs: Tensor<B, 2>, states: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let mapped_inputs = self.map_inputs(inputs);
        let next_state = self.ode_solver(mapped_inputs, states);
        let output = self.map_outputs(next_state.clone());
        (output, next_state)
    }
}

/// Clamp at zero while keeping the parameter id (optimizer state is keyed by it)
fn non_negative<B: Backend, const D: usize>(param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
    param.map(|tensor| {
        let require_grad = tensor.is_require_grad();
        tensor
            .clamp_min(0.0)
            .detach()
            .set_require_grad(require_grad)
    })
}

/// Modules holding LTC parameters that must stay non-negative
pub trait Constrained: Sized {
    /// Clamp the constrained parameters at zero
    fn apply_constraints(self) -> Self;
}

impl<B: Backend> Constrained for LTCCell<B> {
    fn apply_constraints(self) -> Self {
        LTCCell::apply_constraints(self)
    }
}

/// Optimizer step followed by the non-negativity constraints of the module
///
/// Works for a bare [`LTCCell`] and for the [`LTC`](crate::rnn::LTC) layer.
pub fn constrained_step<B, M, O>(
    optimizer: &mut O,
    lr: f64,
    module: M,
    grads: GradientsParams,
) -> M
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Constrained,
    O: Optimizer<M, B>,
{
    Constrained::apply_constraints(optimizer.step(lr, module, grads))
}
