//! Integration tests for the LTC sequence layer

use burn::backend::NdArray;
use burn::module::Module;
use burn::tensor::{Distribution, Tensor};
use ncp_ltc::error::NcpError;
use ncp_ltc::rnn::{LTCConfig, LTC};
use ncp_ltc::wirings::NCP;

type Backend = NdArray<f32>;

fn create_layer(batch_first: bool, return_sequences: bool) -> LTC<Backend> {
    let device = Default::default();
    let wiring = NCP::new(12, 8, 4, 5, 4, 3, 4, 12345).unwrap();
    LTCConfig::new(wiring)
        .with_batch_first(batch_first)
        .with_return_sequences(return_sequences)
        .init(16, &device)
        .unwrap()
}

fn max_abs_diff<const D: usize>(a: Tensor<Backend, D>, b: Tensor<Backend, D>) -> f32 {
    (a - b).abs().max().into_scalar()
}

#[test]
fn test_ltc_sequence_shapes() {
    let device = Default::default();
    let ltc = create_layer(true, true);
    assert_eq!(ltc.input_size(), 16);
    assert_eq!(ltc.state_size(), 24);
    assert_eq!(ltc.motor_size(), 4);

    let input = Tensor::<Backend, 3>::random([4, 10, 16], Distribution::Uniform(-1.0, 1.0), &device);
    let (output, state) = ltc.forward(input, None).unwrap();

    assert_eq!(output.dims(), [4, 10, 4]);
    assert_eq!(state.dims(), [4, 24]);
}

#[test]
fn test_ltc_matches_manual_cell_loop() {
    let device = Default::default();
    let ltc = create_layer(true, true);
    let input = Tensor::<Backend, 3>::random([2, 5, 16], Distribution::Uniform(-1.0, 1.0), &device);

    let (output, state) = ltc.forward(input.clone(), None).unwrap();

    let mut manual_state = Tensor::<Backend, 2>::zeros([2, 24], &device);
    for t in 0..5 {
        let step = input.clone().narrow(1, t, 1).reshape([2, 16]);
        let (step_output, next_state) = ltc.cell().forward(step, manual_state);
        manual_state = next_state;
        let expected = output.clone().narrow(1, t, 1).reshape([2, 4]);
        assert!(max_abs_diff(step_output, expected) < 1e-6);
    }
    assert!(max_abs_diff(manual_state, state) < 1e-6);
}

#[test]
fn test_ltc_state_continues_across_calls() {
    let device = Default::default();
    let ltc = create_layer(true, true);
    let input = Tensor::<Backend, 3>::random([3, 8, 16], Distribution::Uniform(-1.0, 1.0), &device);

    let (full_output, full_state) = ltc.forward(input.clone(), None).unwrap();

    let (first_output, first_state) = ltc.forward(input.clone().narrow(1, 0, 4), None).unwrap();
    let (second_output, second_state) = ltc
        .forward(input.narrow(1, 4, 4), Some(first_state))
        .unwrap();

    let joined = Tensor::cat(vec![first_output, second_output], 1);
    assert!(max_abs_diff(joined, full_output) < 1e-5);
    assert!(max_abs_diff(second_state, full_state) < 1e-5);
}

#[test]
fn test_ltc_batch_first_and_seq_first_agree() {
    let device = Default::default();
    let batch_first = create_layer(true, true);
    // Same parameters in both layouts
    let seq_first = create_layer(false, true).load_record(batch_first.clone().into_record());

    let input = Tensor::<Backend, 3>::random([2, 6, 16], Distribution::Uniform(-1.0, 1.0), &device);
    let (a, state_a) = batch_first.forward(input.clone(), None).unwrap();
    let (b, state_b) = seq_first.forward(input.swap_dims(0, 1), None).unwrap();

    assert!(max_abs_diff(a, b) < 1e-6);
    assert!(max_abs_diff(state_a, state_b) < 1e-6);
}

#[test]
fn test_ltc_return_last_output() {
    let device = Default::default();
    let all_steps = create_layer(true, true);
    let last_only = create_layer(true, false).load_record(all_steps.clone().into_record());

    let input = Tensor::<Backend, 3>::random([2, 7, 16], Distribution::Uniform(-1.0, 1.0), &device);
    let (outputs, _) = all_steps.forward(input.clone(), None).unwrap();
    let (last, _) = last_only.forward(input, None).unwrap();

    assert_eq!(last.dims(), [2, 1, 4]);
    assert!(max_abs_diff(last, outputs.narrow(1, 6, 1)) < 1e-6);
}

#[test]
fn test_ltc_rejects_invalid_inputs() {
    let device = Default::default();
    let ltc = create_layer(true, true);

    let wrong_width = Tensor::<Backend, 3>::zeros([2, 3, 15], &device);
    assert_eq!(
        ltc.forward(wrong_width, None).unwrap_err(),
        NcpError::ConflictingInputDim {
            expected: 16,
            actual: 15
        }
    );

    let input = Tensor::<Backend, 3>::zeros([2, 3, 16], &device);
    let wrong_state = Tensor::<Backend, 2>::zeros([3, 24], &device);
    assert_eq!(
        ltc.forward(input, Some(wrong_state)).unwrap_err(),
        NcpError::StateShapeMismatch {
            expected: [2, 24],
            actual: [3, 24]
        }
    );
}

#[test]
fn test_ltc_config_errors_surface_at_init() {
    let device = Default::default();
    let wiring = NCP::new(12, 8, 4, 5, 4, 3, 4, 12345).unwrap();

    let err = LTCConfig::new(wiring.clone())
        .init::<Backend>(0, &device)
        .unwrap_err();
    assert_eq!(err, NcpError::EmptyInput);

    let err = LTCConfig::new(wiring)
        .with_cell_config(ncp_ltc::cells::LTCCellConfig::new().with_ode_unfolds(0))
        .init::<Backend>(16, &device)
        .unwrap_err();
    assert_eq!(err, NcpError::InvalidOdeUnfolds);
}

#[test]
fn test_ltc_constrained_step_keeps_parameters_non_negative() {
    use burn::backend::Autodiff;
    use burn::optim::{GradientsParams, SgdConfig};
    use ncp_ltc::cells::constrained_step;

    type AutodiffBackend = Autodiff<Backend>;

    let device = Default::default();
    let wiring = NCP::new(12, 8, 4, 5, 4, 3, 4, 12345).unwrap();
    let mut ltc: LTC<AutodiffBackend> = LTCConfig::new(wiring).init(16, &device).unwrap();
    let mut optimizer = SgdConfig::new().init::<AutodiffBackend, LTC<AutodiffBackend>>();

    for _ in 0..2 {
        let input = Tensor::<AutodiffBackend, 3>::random(
            [2, 3, 16],
            Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let (output, _) = ltc.forward(input, None).unwrap();

        // Pushes every constrained parameter far below zero
        let cell = ltc.cell();
        let loss = output.mean()
            + cell.gleak.val().sum()
            + cell.cm.val().sum()
            + cell.w.val().sum()
            + cell.sensory_w.val().sum();
        let grads = GradientsParams::from_grads(loss.backward(), &ltc);

        ltc = constrained_step(&mut optimizer, 50.0, ltc, grads);

        let cell = ltc.cell();
        assert!(cell.gleak.val().min().into_scalar() >= 0.0);
        assert!(cell.cm.val().min().into_scalar() >= 0.0);
        assert!(cell.w.val().min().into_scalar() >= 0.0);
        assert!(cell.sensory_w.val().min().into_scalar() >= 0.0);
    }
}
