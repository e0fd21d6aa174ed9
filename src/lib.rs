//! # NCP-LTC - Neural Circuit Policies with Liquid Time-Constant cells
//!
//! Sparse, biologically inspired recurrent networks built with the Burn
//! framework.
//!
//! ## Features
//!
//! - **NCP wiring**: 4-layer sensory -> inter -> command -> motor circuits
//!   where every neuron is reachable, generated reproducibly from a seed
//! - **LTC cell**: semi-implicit ODE solver over the wired synapses, with
//!   learned conductances, reversal potentials and membrane capacitances
//! - **Sparsity masks**: absent synapses contribute nothing to the dynamics
//! - **Input/Output mapping**: Affine, Linear, or pass-through modes
//! - **Lazy build**: a cell can wait for its first input to learn the input width
//!
//! ## Quick Start
//!
//! ```rust
//! use ncp_ltc::prelude::*;
//!
//! let wiring = NCP::new(4, 3, 2, 2, 2, 1, 2, 22222)?;
//! let bound = wiring.bind(16)?; // 16 input features
//!
//! assert_eq!(bound.units(), 9);
//! assert_eq!(bound.output_dim(), 2);
//! assert_eq!(bound.sensory_adjacency_matrix().shape(), &[16, 9]);
//! # Ok::<(), ncp_ltc::error::NcpError>(())
//! ```
//!
//! ## Cell-level Usage
//!
//! For direct cell access (single timestep processing):
//!
//! ```ignore
//! use ncp_ltc::cells::{LTCCellConfig, MappingMode};
//! use ncp_ltc::wirings::{FullyConnected, Wiring};
//!
//! let wiring = FullyConnected::new(32, Some(8), 1234, true)?.bind(16)?;
//! let cell = LTCCellConfig::new()
//!     .with_input_mapping(MappingMode::Affine)
//!     .init::<Backend>(wiring, &device)?;
//! let (output, next_state) = cell.forward(inputs, states);
//! ```

pub mod cells;
pub mod error;
pub mod rnn;
pub mod wirings;

pub mod prelude {
    pub use crate::cells::{LTCCell, LTCCellConfig, LazyLTCCell, MappingMode};
    pub use crate::error::{NcpError, Result};
    pub use crate::rnn::{LTCConfig, LTC};
    pub use crate::wirings::{BoundWiring, FullyConnected, NeuronType, Wiring, NCP};
}
