//! NCP (Neural Circuit Policy) Wiring Example
//!
//! Builds a small NCP circuit, prints its synapse graph and runs an LTC
//! layer over a random sequence. Set `RUST_LOG=debug` to see the wiring passes.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use ncp_ltc::error::Result;
use ncp_ltc::rnn::LTCConfig;
use ncp_ltc::wirings::{NeuronType, Wiring, NCP};
use tracing_subscriber::EnvFilter;

type Backend = NdArray<f32>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== NCP Wiring Example ===\n");

    let wiring = NCP::new(
        12,    // inter_neurons (layer 2)
        8,     // command_neurons (layer 3)
        4,     // motor_neurons (layer 4 = outputs)
        5,     // sensory_fanout (connections from input to inter)
        4,     // inter_fanout (connections from inter to command)
        3,     // recurrent_command_synapses (within command)
        4,     // motor_fanin (connections from command to motor)
        12345, // random seed
    )?;

    let bound = wiring.bind(16)?;
    println!("Units:            {}", bound.units());
    println!("Motor outputs:    {}", bound.output_dim());
    println!("Synapses:         {}", bound.synapse_count());
    println!("Sensory synapses: {}", bound.sensory_synapse_count());
    println!();

    let graph = bound.graph();
    for neuron_type in [NeuronType::Inter, NeuronType::Command, NeuronType::Motor] {
        let nodes: Vec<String> = graph
            .nodes_of_type(neuron_type)
            .map(|node| node.id.to_string())
            .collect();
        println!("{neuron_type:>8}: {}", nodes.join(", "));
    }
    println!();
    for edge in graph.edges().iter().take(10) {
        println!("  {} -> {} ({})", edge.src, edge.dest, edge.polarity);
    }
    println!("  ... {} edges in total\n", graph.edges().len());

    let device = Default::default();
    let ltc = LTCConfig::new(wiring).init::<Backend>(16, &device)?;
    let input = Tensor::<Backend, 3>::random([2, 20, 16], Distribution::Uniform(-1.0, 1.0), &device);
    let (output, state) = ltc.forward(input, None)?;

    println!("Input shape:  [2, 20, 16]");
    println!("Output shape: {:?}", output.dims());
    println!("State shape:  {:?}", state.dims());

    Ok(())
}
