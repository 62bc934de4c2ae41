//! Locating and connecting to a hardware plugin.
//!
//! Plugins ship as shared libraries named `lib<name>.so`. The engine is given
//! a list of directories and tries them in order; the first directory whose
//! library loads wins.

use crate::backends::InferencePlugin;
use crate::error::DlInferError;
use crate::types::describe_version;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Path of the plugin library `name` inside `dir`.
///
/// An empty `dir` yields the bare library name, leaving the lookup to the
/// dynamic loader.
pub fn plugin_library_name(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("lib{name}.so"))
}

/// The device a plugin executes on.
///
/// Legacy Inference Engine plugin names and current OpenVINO library names are
/// both understood; anything else is taken to already be a device name.
pub fn device_name(plugin_name: &str) -> &str {
    match plugin_name {
        "MKLDNNPlugin" | "openvino_intel_cpu_plugin" => "CPU",
        "clDNNPlugin" | "openvino_intel_gpu_plugin" => "GPU",
        "myriadPlugin" | "openvino_intel_myriad_plugin" => "MYRIAD",
        "GNAPlugin" | "openvino_intel_gna_plugin" => "GNA",
        "HeteroPlugin" | "openvino_hetero_plugin" => "HETERO",
        "openvino_intel_npu_plugin" => "NPU",
        "openvino_auto_plugin" => "AUTO",
        other => other,
    }
}

/// Try each directory in turn until `load` accepts the plugin library found there.
///
/// Each failed directory is recorded as
/// `cannot load plugin: <name> from <dir>: <reason>, skipping`. All of them are
/// logged, and returned in [`DlInferError::PluginNotFound`], when no directory
/// works.
pub fn select_plugin<F>(
    dirs: &[PathBuf],
    name: &str,
    mut load: F,
) -> Result<Box<dyn InferencePlugin>, DlInferError>
where
    F: FnMut(&Path) -> Result<Box<dyn InferencePlugin>, DlInferError>,
{
    let mut attempts = Vec::new();
    for dir in dirs {
        let library = plugin_library_name(dir, name);
        match load(&library) {
            Ok(plugin) => {
                info!(
                    "Loaded plugin {}\n{}",
                    library.display(),
                    describe_version(plugin.version().as_ref())
                );
                return Ok(plugin);
            }
            Err(e) => attempts.push(format!(
                "cannot load plugin: {} from {}: {}, skipping",
                name,
                dir.display(),
                e
            )),
        }
    }

    for attempt in &attempts {
        warn!("{}", attempt);
    }
    Err(DlInferError::PluginNotFound {
        name: name.to_string(),
        attempts,
    })
}
