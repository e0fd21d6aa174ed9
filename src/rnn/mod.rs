//! # RNN Layer for Sequence Processing
//!
//! [`LTC`] processes whole sequences with an [`LTCCell`](crate::cells::LTCCell),
//! managing the hidden state between steps.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ncp_ltc::prelude::*;
//!
//! let wiring = NCP::new(12, 8, 4, 5, 4, 3, 4, 12345)?;
//! let ltc = LTCConfig::new(wiring).init::<Backend>(16, &device)?;
//!
//! // [batch=4, seq_len=10, features=16]
//! let input: Tensor<Backend, 3> = Tensor::zeros([4, 10, 16], &device);
//! let (output, final_state) = ltc.forward(input, None)?;
//!
//! // output: [4, 10, 4] - motor neurons at every step
//! // final_state: [4, 24] - every neuron
//! ```
//!
//! ## Tensor Shapes
//!
//! | Setting | Input | Output |
//! |---------|-------|--------|
//! | `batch_first=true` (default) | `[batch, seq, features]` | `[batch, seq, motor]` |
//! | `batch_first=false` | `[seq, batch, features]` | `[batch, seq, motor]` |
//! | `return_sequences=false` | either | `[batch, 1, motor]` |
//!
//! The hidden state is `[batch, units]` and can be passed back in to
//! continue a sequence across calls.

pub mod ltc;

pub use ltc::{LTCConfig, LTC};
