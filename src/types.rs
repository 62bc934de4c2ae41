//! Common types shared by the engine, its plugins and callers.
//!
//! These types describe what a plugin reports about a loaded network, how it
//! identifies itself, how it accounts for the time spent per layer, and what an
//! inference ultimately produces for each image.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric precision of a network input or output.
///
/// Mirrors the precisions the Inference Engine understands. Only `FP32`,
/// `I16`, `Q78` and `U8` can be used for input blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    FP32,
    FP16,
    /// 16-bit fixed point with 8 fractional bits.
    Q78,
    I16,
    U8,
    I8,
    U16,
    I32,
    Unspecified,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Precision::FP32 => "FP32",
            Precision::FP16 => "FP16",
            Precision::Q78 => "Q78",
            Precision::I16 => "I16",
            Precision::U8 => "U8",
            Precision::I8 => "I8",
            Precision::U16 => "U16",
            Precision::I32 => "I32",
            Precision::Unspecified => "UNSPECIFIED",
        };
        f.write_str(name)
    }
}

/// What a plugin learned about a network after reading it.
///
/// Input dimensions follow the `NCHW` convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    /// Batch dimension declared by the network
    pub batch_size: usize,
    /// Number of color channels per image (1 = grayscale, 3 = color)
    pub channels: usize,
    /// Required height of input images in pixels
    pub height: usize,
    /// Required width of input images in pixels
    pub width: usize,
    /// Precision of the network input
    pub precision: Precision,
    /// Number of output classes per image
    pub classes: usize,
}

impl NetworkInfo {
    /// Number of input values a single batch item occupies.
    pub fn input_size(&self) -> usize {
        self.channels * self.height * self.width
    }

    pub fn input_dims(&self) -> [usize; 4] {
        [self.batch_size, self.channels, self.height, self.width]
    }
}

/// Self-description reported by a plugin once it has been loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    pub api_major: u32,
    pub api_minor: u32,
    pub description: Option<String>,
    pub build_number: Option<String>,
}

/// Formats a plugin version the way the engine logs it after plugin selection.
///
/// Missing pieces are reported as `UNKNOWN`.
pub fn describe_version(version: Option<&Version>) -> String {
    let api = version
        .map(|v| format!("{}.{}", v.api_major, v.api_minor))
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let name = version
        .and_then(|v| v.description.as_deref())
        .unwrap_or("UNKNOWN");
    let build = version
        .and_then(|v| v.build_number.as_deref())
        .unwrap_or("UNKNOWN");

    format!(
        "\tPlugin version ......... {api}\n\tPlugin name ............ {name}\n\tPlugin build ........... {build}"
    )
}

/// Execution status of one layer in a profiled inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfileStatus {
    Executed,
    NotRun,
    OptimizedOut,
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            ProfileStatus::Executed => "EXECUTED",
            ProfileStatus::NotRun => "NOT_RUN",
            ProfileStatus::OptimizedOut => "OPTIMIZED_OUT",
        };
        f.write_str(status)
    }
}

/// Timing of one layer, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileInfo {
    pub status: ProfileStatus,
    pub real_time_us: i64,
    pub cpu_us: i64,
}

/// One ranked class for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassResult {
    /// Class index in the network output
    pub id: usize,
    /// Score the network assigned to the class
    pub probability: f32,
    /// Label from the label file, or `label #<id>` when the file has none
    pub label: String,
}

impl fmt::Display for ClassResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.7} label {}", self.id, self.probability, self.label)
    }
}

/// The top classes of a single image, highest probability first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResults {
    /// Path of the image the results belong to
    pub image: String,
    pub results: Vec<ClassResult>,
}

impl InferenceResults {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            results: Vec::new(),
        }
    }

    pub fn add_result(&mut self, result: ClassResult) {
        self.results.push(result);
    }

    /// The best-ranked class, if any were requested.
    pub fn top(&self) -> Option<&ClassResult> {
        self.results.first()
    }
}

impl fmt::Display for InferenceResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Image {}", self.image)?;
        for result in &self.results {
            writeln!(f, "{result}")?;
        }
        Ok(())
    }
}
