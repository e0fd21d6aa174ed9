//! Error type shared by the wiring builder and the LTC cell.

use thiserror::Error;

use crate::wirings::NeuronType;

/// Errors raised while configuring, binding or running a circuit.
///
/// Every variant is fatal: the caller has to fix the configuration (or the
/// call order) and construct a new object.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NcpError {
    #[error("motor fanin is {motor_fanin} but there are only {command_neurons} command neurons")]
    MotorFaninTooLarge {
        motor_fanin: usize,
        command_neurons: usize,
    },
    #[error("sensory fanout is {sensory_fanout} but there are only {inter_neurons} inter neurons")]
    SensoryFanoutTooLarge {
        sensory_fanout: usize,
        inter_neurons: usize,
    },
    #[error("inter fanout is {inter_fanout} but there are only {command_neurons} command neurons")]
    InterFanoutTooLarge {
        inter_fanout: usize,
        command_neurons: usize,
    },
    #[error("the {group} group needs at least one neuron")]
    EmptyGroup { group: NeuronType },
    #[error("{name} must be at least 1")]
    ZeroFanout { name: &'static str },
    #[error("output dimension {output_dim} exceeds the {units} available units")]
    OutputDimTooLarge { output_dim: usize, units: usize },
    #[error("input dimension must be at least 1")]
    EmptyInput,
    #[error("conflicting input dimensions: wiring is bound to {expected} features but got {actual}")]
    ConflictingInputDim { expected: usize, actual: usize },
    #[error("cannot add synapse {src} -> {dest}: sources must be below {src_limit} and destinations below {dest_limit}")]
    SynapseOutOfRange {
        src: usize,
        dest: usize,
        src_limit: usize,
        dest_limit: usize,
    },
    #[error("cannot add synapse with polarity {0} (expected -1 or +1)")]
    InvalidPolarity(i32),
    #[error("cannot add sensory synapses before the input dimension is known")]
    SensoryWidthUnknown,
    #[error("the LTC cell is not built yet; its input dimension is still unknown")]
    NotBuilt,
    #[error("unknown layer {0}")]
    UnknownLayer(usize),
    #[error("unknown parameter '{0}' in initialization ranges (expected one of gleak, vleak, cm, w, sigma, mu, sensory_w, sensory_sigma, sensory_mu)")]
    UnknownParameter(String),
    #[error("initialization range of '{name}' must be non-negative, got minimum {min}")]
    NegativeRange { name: &'static str, min: f64 },
    #[error("initialization range of '{name}' is not a valid range: ({min}, {max})")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
    #[error("ode_unfolds must be at least 1")]
    InvalidOdeUnfolds,
    #[error("epsilon must be a finite non-negative number, got {0}")]
    InvalidEpsilon(f64),
    #[error("input sequence is empty")]
    EmptySequence,
    #[error("initial state has shape {actual:?} but the layer expects {expected:?}")]
    StateShapeMismatch {
        expected: [usize; 2],
        actual: [usize; 2],
    },
    #[error("invalid wiring config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, NcpError>;
