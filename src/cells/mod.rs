//! # LTC Cell
//!
//! Single-timestep Liquid Time-Constant cell. The higher-level
//! [`LTC`](crate::rnn::LTC) layer wraps it for sequence processing.
//!
//! ## Dynamics
//!
//! Each recurrence step unfolds the neuron ODE `ode_unfolds` times with a
//! fixed sub-step of `1 / ode_unfolds`:
//!
//! ```text
//! v ← (cm_t·v + gleak·vleak + Σ w·σ(sigma·(v_src − mu))·erev)
//!     / (cm_t + gleak + Σ w·σ(sigma·(v_src − mu)) + ε)
//! cm_t = cm / (1 / ode_unfolds)
//! ```
//!
//! The sums run over internal and sensory synapses, each masked by the
//! wiring's adjacency pattern.
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | `inputs` | `[batch, sensory_size]` |
//! | `states` | `[batch, state_size]` |
//! | `output` | `[batch, motor_size]` |
//! | `next_state` | `[batch, state_size]` |
//!
//! ## Input/Output Mapping Modes
//!
//! - **Affine**: `w * x + b` (default)
//! - **Linear**: `w * x`
//! - **None**: pass-through

mod init_ranges;
mod lazy;
mod ltc_cell;

pub use init_ranges::{InitRanges, ParamName};
pub use lazy::LazyLTCCell;
pub use ltc_cell::{constrained_step, Constrained, LTCCell, LTCCellConfig, MappingMode};
