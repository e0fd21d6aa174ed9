use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::{LTCCell, LTCCellConfig};
use crate::error::{NcpError, Result};
use crate::wirings::{Wiring, WiringGraph};

/// An LTC cell that is built the first time it sees an input.
///
/// Starts `Unbuilt` with a wiring definition and cell options; the first
/// [`forward`](Self::forward) (or [`build`](Self::build)) binds the wiring to
/// the input width and allocates the parameters. Later inputs must have the
/// same width.
#[derive(Debug)]
pub enum LazyLTCCell<B: Backend> {
    Unbuilt {
        wiring: Box<dyn Wiring>,
        config: LTCCellConfig,
    },
    Built(LTCCell<B>),
}

impl<B: Backend> LazyLTCCell<B> {
    pub fn new(wiring: impl Wiring + 'static, config: LTCCellConfig) -> Result<Self> {
        config.validate()?;
        Ok(LazyLTCCell::Unbuilt {
            wiring: Box::new(wiring),
            config,
        })
    }

    pub fn is_built(&self) -> bool {
        matches!(self, LazyLTCCell::Built(_))
    }

    /// Number of internal neurons, known before the build
    pub fn state_size(&self) -> usize {
        match self {
            LazyLTCCell::Unbuilt { wiring, .. } => wiring.units(),
            LazyLTCCell::Built(cell) => cell.state_size(),
        }
    }

    /// Build for `input_dim` features, or check the width of an already built cell
    pub fn build(&mut self, input_dim: usize, device: &B::Device) -> Result<&LTCCell<B>> {
        if let LazyLTCCell::Unbuilt { wiring, config } = self {
            let bound = wiring.bind(input_dim)?;
            let cell = config.init(bound, device)?;
            *self = LazyLTCCell::Built(cell);
        }
        let cell = self.cell()?;
        cell.wiring().ensure_input_dim(input_dim)?;
        Ok(cell)
    }

    pub fn cell(&self) -> Result<&LTCCell<B>> {
        match self {
            LazyLTCCell::Built(cell) => Ok(cell),
            LazyLTCCell::Unbuilt { .. } => Err(NcpError::NotBuilt),
        }
    }

    pub fn into_cell(self) -> Result<LTCCell<B>> {
        match self {
            LazyLTCCell::Built(cell) => Ok(cell),
            LazyLTCCell::Unbuilt { .. } => Err(NcpError::NotBuilt),
        }
    }

    pub fn graph(&self) -> Result<WiringGraph> {
        Ok(self.cell()?.graph())
    }

    /// One recurrence step, building the cell on first use
    ///
    /// `states` must be `[batch, state_size]` for the batch of `inputs`.
    pub fn forward(
        &mut self,
        inputs: Tensor<B, 2>,
        states: Tensor<B, 2>,
    ) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        let [batch_size, input_dim] = inputs.dims();
        let expected = [batch_size, self.state_size()];
        if states.dims() != expected {
            return Err(NcpError::StateShapeMismatch {
                expected,
                actual: states.dims(),
            });
        }
        let device = inputs.device();
        let cell = self.build(input_dim, &device)?;
        Ok(cell.forward(inputs, states))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wirings::NCP;
    use burn::backend::NdArray;

    type Backend = NdArray<f32>;

    fn lazy_cell() -> LazyLTCCell<Backend> {
        let wiring = NCP::new(4, 3, 2, 2, 2, 1, 2, 22222).unwrap();
        LazyLTCCell::new(wiring, LTCCellConfig::new()).unwrap()
    }

    #[test]
    fn test_graph_before_build_fails() {
        let cell = lazy_cell();
        assert!(!cell.is_built());
        assert_eq!(cell.state_size(), 9);
        assert_eq!(cell.graph().unwrap_err(), NcpError::NotBuilt);
    }

    #[test]
    fn test_first_forward_builds() {
        let device = Default::default();
        let mut cell = lazy_cell();

        let inputs = Tensor::<Backend, 2>::zeros([2, 3], &device);
        let states = Tensor::<Backend, 2>::zeros([2, 9], &device);
        let (output, next) = cell.forward(inputs, states).unwrap();

        assert!(cell.is_built());
        assert_eq!(output.dims(), [2, 2]);
        assert_eq!(next.dims(), [2, 9]);
        assert_eq!(cell.cell().unwrap().sensory_size(), 3);
        assert!(cell.graph().is_ok());
    }

    #[test]
    fn test_conflicting_width_after_build() {
        let device = Default::default();
        let mut cell = lazy_cell();
        cell.build(3, &device).unwrap();

        let inputs = Tensor::<Backend, 2>::zeros([2, 5], &device);
        let states = Tensor::<Backend, 2>::zeros([2, 9], &device);
        assert_eq!(
            cell.forward(inputs, states).unwrap_err(),
            NcpError::ConflictingInputDim {
                expected: 3,
                actual: 5
            }
        );
    }

    #[test]
    fn test_bad_state_shape_is_rejected() {
        let device = Default::default();
        let mut cell = lazy_cell();
        let inputs = Tensor::<Backend, 2>::zeros([2, 3], &device);

        let narrow_state = Tensor::<Backend, 2>::zeros([2, 7], &device);
        assert_eq!(
            cell.forward(inputs.clone(), narrow_state).unwrap_err(),
            NcpError::StateShapeMismatch {
                expected: [2, 9],
                actual: [2, 7]
            }
        );
        // Shape errors are detected before the cell is built
        assert!(!cell.is_built());

        let wrong_batch = Tensor::<Backend, 2>::zeros([5, 9], &device);
        assert_eq!(
            cell.forward(inputs, wrong_batch).unwrap_err(),
            NcpError::StateShapeMismatch {
                expected: [2, 9],
                actual: [5, 9]
            }
        );
    }

    #[test]
    fn test_invalid_config_rejected_before_build() {
        let wiring = NCP::new(4, 3, 2, 2, 2, 1, 2, 22222).unwrap();
        let err = LazyLTCCell::<Backend>::new(wiring, LTCCellConfig::new().with_ode_unfolds(0))
            .unwrap_err();
        assert_eq!(err, NcpError::InvalidOdeUnfolds);
    }
}
