//! Per-layer performance counts of the last inference.

use crate::types::ProfileInfo;
use std::collections::BTreeMap;
use std::fmt;

/// Performance counts reported by a plugin, printable as the engine's table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformanceReport {
    layers: BTreeMap<String, ProfileInfo>,
}

impl PerformanceReport {
    pub fn new(layers: BTreeMap<String, ProfileInfo>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &BTreeMap<String, ProfileInfo> {
        &self.layers
    }

    /// Sum of the positive real times, in microseconds.
    pub fn total_time_us(&self) -> i64 {
        self.layers
            .values()
            .map(|info| info.real_time_us)
            .filter(|&time| time > 0)
            .sum()
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Performance counts:")?;
        writeln!(f)?;
        for (layer, info) in &self.layers {
            writeln!(
                f,
                "{:<30}{:<15}{:<20} cpu: {}",
                format!("{layer}:"),
                info.status.to_string(),
                format!("realTime: {}", info.real_time_us),
                info.cpu_us
            )?;
        }
        writeln!(
            f,
            "{:<20} microseconds",
            format!("Total time: {}", self.total_time_us())
        )
    }
}
