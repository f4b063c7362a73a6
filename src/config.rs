// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Wall-clock budget for a labeling solve unless configured otherwise.
pub const DEFAULT_TIME_LIMIT_SECS: f64 = 300.0;

/// Knobs for a synthesis run. Passed explicitly into every entry point; the
/// core never consults globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Weight of the semiperimeter term against the maximum-dimension term in
    /// the labeling objective. Must lie in `[0, 1]`.
    pub gamma: f64,
    /// Pin roots and terminals onto horizontal wires (layer 0) so the input
    /// and output rails are row wires.
    pub io_constraints: bool,
    /// Wall-clock budget for the labeling solve; `None` means unbounded. When
    /// it runs out the best labeling found so far is used.
    pub time_limit_secs: Option<f64>,
    /// Number of memristor layers; 1 selects the 2D VH formulation.
    pub layers: usize,
    /// Capacity budget `D` for the pattern-sharing scheduler.
    pub capacity: Option<usize>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            gamma: 0.5,
            io_constraints: true,
            time_limit_secs: Some(DEFAULT_TIME_LIMIT_SECS),
            layers: 1,
            capacity: None,
        }
    }
}

impl SynthConfig {
    pub fn time_limit(&self) -> Option<std::time::Duration> {
        self.time_limit_secs
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(std::time::Duration::from_secs_f64)
    }

    /// Returns a description of the first invalid setting, if any.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must lie in [0, 1]; got {}", self.gamma));
        }
        if self.layers == 0 {
            return Err("layers must be at least 1".to_string());
        }
        if let Some(secs) = self.time_limit_secs {
            if !secs.is_finite() || secs < 0.0 {
                return Err(format!(
                    "time_limit_secs must be a non-negative number; got {}",
                    secs
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SynthConfig::default();
        assert_eq!(config.gamma, 0.5);
        assert!(config.io_constraints);
        assert_eq!(
            config.time_limit(),
            Some(std::time::Duration::from_secs(300))
        );
        assert_eq!(config.layers, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: SynthConfig = serde_json::from_str(r#"{"gamma": 1.0, "layers": 2}"#).unwrap();
        assert_eq!(config.gamma, 1.0);
        assert_eq!(config.layers, 2);
        assert!(config.io_constraints);
        assert_eq!(config.capacity, None);
    }

    #[test]
    fn test_validate_rejects_out_of_range_gamma() {
        let config = SynthConfig {
            gamma: 1.5,
            ..SynthConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("gamma"));
    }
}
