//! Basic Classification Example
//!
//! This example classifies one or more images with a trained network and
//! prints the top classes of each image.
//!
//! The program will:
//! 1. Connect to the requested plugin and read the network
//! 2. Load the images, filling or truncating the network batch
//! 3. Load the network into the plugin and run an inference
//! 4. Print the top results and, on request, the performance counts
//!
//! Usage:
//!   cargo run --features openvino --example basic_classification -- \
//!     --model <model.xml> --plugin-dir <dir> --plugin MKLDNNPlugin --image <image> [--top 10]

use clap::Parser;
use dlinfer::{Configurator, InferenceEngine};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the network description (.xml); weights are read from the .bin next to it
    #[arg(short, long)]
    model: PathBuf,

    /// Directory to search for the plugin library (repeatable)
    #[arg(long = "plugin-dir", required = true)]
    plugin_dirs: Vec<PathBuf>,

    /// Plugin name, e.g. MKLDNNPlugin or clDNNPlugin
    #[arg(short, long, default_value = "MKLDNNPlugin")]
    plugin: String,

    /// Label file; defaults to <model>.labels
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Image to classify (repeatable)
    #[arg(short, long = "image", required = true)]
    images: Vec<PathBuf>,

    /// Number of top results to print per image
    #[arg(short, long, default_value_t = 10)]
    top: usize,

    /// Subtract the ILSVRC 2012 channel means from FP32 input
    #[arg(long, default_value_t = false)]
    mean_scalars: bool,

    /// Print per-layer performance counts after the inference
    #[arg(long, default_value_t = false)]
    perf_counts: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = Configurator::new(
        &args.model,
        args.plugin_dirs,
        args.plugin,
        args.labels.as_deref(),
    )?;
    let mut engine = InferenceEngine::new(&config)?;

    if args.mean_scalars {
        engine.set_ilsvrc2012_mean_scalars()?;
    }
    engine.load_images(&args.images)?;
    engine.load_model()?;
    engine.infer()?;

    println!("Top {} results:\n", args.top);
    for results in engine.top_results(args.top)? {
        println!("{results}");
    }

    if args.perf_counts {
        print!("{}", engine.performance_counts());
    }

    Ok(())
}
