//! # dlinfer
//!
//! A Rust binding layer for the Intel Deep Learning Inference Engine.
//!
//! The crate configures a trained network, connects it to a hardware plugin,
//! turns images into input blobs, runs synchronous inferences and ranks the
//! scores per image.
//!
//! ```no_run
//! use dlinfer::{Configurator, InferenceEngine};
//!
//! let config = Configurator::new(
//!     "/models/CaffeNet.xml",
//!     ["/opt/intel/inference_engine/lib/intel64"],
//!     "MKLDNNPlugin",
//!     None,
//! )?;
//! let mut engine = InferenceEngine::new(&config)?;
//! engine.set_ilsvrc2012_mean_scalars()?;
//! engine.load_images(&["cat.bmp", "dog.bmp"])?;
//! engine.load_model()?;
//! engine.infer()?;
//! for results in engine.top_results(5)? {
//!     print!("{results}");
//! }
//! # Ok::<(), dlinfer::DlInferError>(())
//! ```
//!
//! ## Features
//!
//! - `openvino`: execute networks through the OpenVINO Inference Engine. Without
//!   it the crate builds without the native SDK, and plugins have to be supplied
//!   through [`InferenceEngine::with_plugin`].

pub mod backends;
pub mod blob;
pub mod config;
mod engine;
mod error;
pub mod input;
pub mod labels;
pub mod perf;
pub mod plugin;
pub mod ranking;
pub mod types;

pub use config::{ChannelOrder, Configurator, ImageOptions};
pub use engine::{get_top_result, infer, load_image, InferenceEngine, ILSVRC2012_MEAN_SCALARS};
pub use error::DlInferError;
pub use perf::PerformanceReport;
pub use types::{ClassResult, InferenceResults, NetworkInfo, Precision};

#[cfg(test)]
mod testing;
